use async_trait::async_trait;
use tracing::warn;

/// A single file received in a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Lower-cased extension of the original filename, if any.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.filename.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// Where an uploaded image ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Object key inside the store, used for removal
    pub key: String,
    /// Public URL saved on the user record
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ImageStoreError {
    #[error("Image storage is not configured")]
    Disabled,

    #[error("Image upload failed: {0}")]
    UploadFailed(String),

    #[error("Image removal failed: {0}")]
    RemoveFailed(String),
}

/// External storage for profile images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, file: UploadedFile) -> Result<StoredImage, ImageStoreError>;
    async fn remove(&self, key: &str) -> Result<(), ImageStoreError>;
}

/// Used when no object store is configured; every upload is refused.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledImageStore;

#[async_trait]
impl ImageStore for DisabledImageStore {
    async fn upload(&self, file: UploadedFile) -> Result<StoredImage, ImageStoreError> {
        warn!(filename = %file.filename, "Rejecting upload, no image store configured");
        Err(ImageStoreError::Disabled)
    }

    async fn remove(&self, _key: &str) -> Result<(), ImageStoreError> {
        Err(ImageStoreError::Disabled)
    }
}
