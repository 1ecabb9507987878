use crate::config::MinioConfig;
use crate::util::image_store::{ImageStore, ImageStoreError, StoredImage, UploadedFile};
use async_trait::async_trait;
use minio::s3::args::{BucketExistsArgs, MakeBucketArgs, PutObjectArgs, RemoveObjectArgs};
use minio::s3::client::{Client, ClientBuilder};
use minio::s3::creds::StaticProvider;
use minio::s3::http::BaseUrl;
use std::io::Cursor;
use tracing::{debug, error, info, instrument, warn};

/// Profile image storage backed by a MinIO bucket.
#[derive(Debug, Clone)]
pub struct MinioService {
    client: Client,
    pub config: MinioConfig,
}

impl MinioService {
    /// Connect and make sure the configured bucket exists.
    #[instrument(skip(config), fields(endpoint = %config.endpoint, bucket = %config.bucket_name))]
    pub async fn new(config: MinioConfig) -> Result<Self, MinioError> {
        info!("Initializing MinIO service");

        config.validate().map_err(|e| MinioError::ConfigError(e.to_string()))?;

        let base_url = config.get_endpoint_url().parse::<BaseUrl>()
            .map_err(|e| MinioError::ConnectionError(format!("Invalid endpoint URL: {}", e)))?;

        let static_provider = StaticProvider::new(&config.access_key, &config.secret_key, None);
        let client = ClientBuilder::new(base_url)
            .provider(Some(Box::new(static_provider)))
            .build()
            .map_err(|e| MinioError::ConnectionError(format!("Client creation failed: {}", e)))?;

        let service = Self { client, config };
        service.ensure_bucket_exists().await?;

        info!("MinIO service initialized successfully");
        Ok(service)
    }

    async fn ensure_bucket_exists(&self) -> Result<(), MinioError> {
        let bucket = &self.config.bucket_name;
        let exists_args = BucketExistsArgs::new(bucket)
            .map_err(|e| MinioError::InvalidArguments(e.to_string()))?;
        let exists = self.client.bucket_exists(&exists_args).await
            .map_err(|e| MinioError::OperationError(format!("Bucket exists check failed: {}", e)))?;
        if exists {
            debug!("Bucket '{}' already exists", bucket);
            return Ok(());
        }

        warn!("Bucket '{}' does not exist, creating it", bucket);
        let make_args = MakeBucketArgs::new(bucket)
            .map_err(|e| MinioError::InvalidArguments(e.to_string()))?;
        self.client.make_bucket(&make_args).await
            .map_err(|e| MinioError::OperationError(format!("Bucket creation failed: {}", e)))?;
        info!("Created bucket '{}'", bucket);
        Ok(())
    }

    /// Object key for a new image: `<folder>/<uuid>[.<ext>]`.
    pub fn object_name_for(&self, file: &UploadedFile) -> String {
        let folder = self.config.image_folder.trim_matches('/');
        let id = uuid::Uuid::new_v4();
        match file.extension() {
            Some(ext) => format!("{}/{}.{}", folder, id, ext),
            None => format!("{}/{}", folder, id),
        }
    }

    #[instrument(skip(self, data), fields(object_name = %object_name, size = data.len()))]
    pub async fn put_object(
        &self,
        object_name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), MinioError> {
        let bucket_name = self.config.bucket_name.clone();
        let object_name_owned = object_name.to_string();
        let client = self.client.clone();
        let content_type_owned = content_type.to_string();

        // put_object borrows the reader for the whole request, so it runs on a blocking thread
        tokio::task::spawn_blocking(move || {
            let mut reader = Cursor::new(data);
            let data_len = reader.get_ref().len();
            let mut args = PutObjectArgs::new(
                &bucket_name,
                &object_name_owned,
                &mut reader,
                Some(data_len),
                None,
            ).map_err(|e| MinioError::InvalidArguments(e.to_string()))?;
            args.content_type = &content_type_owned;

            futures::executor::block_on(client.put_object(&mut args))
                .map_err(|e| MinioError::OperationError(format!("Upload failed: {}", e)))?;
            Ok::<(), MinioError>(())
        })
        .await
        .map_err(|e| MinioError::OperationError(format!("Join error: {}", e)))??;

        info!("Uploaded object '{}'", object_name);
        Ok(())
    }

    #[instrument(skip(self), fields(object_name = %object_name))]
    pub async fn remove_object(&self, object_name: &str) -> Result<(), MinioError> {
        let args = RemoveObjectArgs::new(&self.config.bucket_name, object_name)
            .map_err(|e| MinioError::InvalidArguments(e.to_string()))?;
        self.client.remove_object(&args).await
            .map_err(|e| MinioError::OperationError(format!("Delete failed: {}", e)))?;
        info!("Removed object '{}'", object_name);
        Ok(())
    }

    /// Public link to an object (direct, unsigned)
    pub fn generate_download_link(&self, object_name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.links_prefix.trim_end_matches('/'),
            self.config.bucket_name,
            object_name
        )
    }
}

#[async_trait]
impl ImageStore for MinioService {
    async fn upload(&self, file: UploadedFile) -> Result<StoredImage, ImageStoreError> {
        let key = self.object_name_for(&file);
        self.put_object(&key, file.content, &file.content_type)
            .await
            .map_err(|e| {
                error!("Profile image upload failed: {}", e);
                ImageStoreError::UploadFailed(e.to_string())
            })?;
        let url = self.generate_download_link(&key);
        Ok(StoredImage { key, url })
    }

    async fn remove(&self, key: &str) -> Result<(), ImageStoreError> {
        self.remove_object(key)
            .await
            .map_err(|e| ImageStoreError::RemoveFailed(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MinioError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Operation error: {0}")]
    OperationError(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}
