use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::{parsed_var, required_var, ConfigError};

/// Object store holding profile images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinioConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket_name: String,
    /// Public base URL used when building image links
    pub links_prefix: String,
    /// Folder (key prefix) that uploaded images land in
    pub image_folder: String,
    pub region: String,
    pub secure: bool,
}

impl MinioConfig {
    /// Load MinIO configuration from environment variables
    ///
    /// Expected environment variables:
    /// - MINIO_ENDPOINT: MinIO server endpoint (e.g., "localhost:9000")
    /// - MINIO_ACCESS_KEY / MINIO_SECRET_KEY: Credentials
    /// - MINIO_BUCKET_NAME: Bucket for profile images
    /// - MINIO_LINKS_PREFIX: Public base URL (defaults to "http://127.0.0.1:9000")
    /// - MINIO_IMAGE_FOLDER: Key prefix for images (defaults to "users")
    /// - MINIO_REGION: Optional region (defaults to "us-east-1")
    /// - MINIO_SECURE: Whether to use HTTPS (defaults to false)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading MinIO configuration from environment variables");

        let config = Self {
            endpoint: required_var("MINIO_ENDPOINT")?,
            access_key: required_var("MINIO_ACCESS_KEY")?,
            secret_key: required_var("MINIO_SECRET_KEY")?,
            bucket_name: required_var("MINIO_BUCKET_NAME")?,
            links_prefix: parsed_var("MINIO_LINKS_PREFIX", "http://127.0.0.1:9000".to_string())?,
            image_folder: parsed_var("MINIO_IMAGE_FOLDER", "users".to_string())?,
            region: parsed_var("MINIO_REGION", "us-east-1".to_string())?,
            secure: parsed_var("MINIO_SECURE", false)?,
        };
        debug!(
            endpoint = %config.endpoint,
            bucket = %config.bucket_name,
            folder = %config.image_folder,
            secure = config.secure,
            "MinIO settings read"
        );

        config.validate()?;
        info!("MinIO configuration loaded successfully");
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: &str| {
            error!("Invalid MinIO configuration: {}", msg);
            Err(ConfigError::ValidationError(msg.to_string()))
        };

        if self.endpoint.is_empty() {
            return fail("Endpoint cannot be empty");
        }
        if self.access_key.is_empty() || self.secret_key.is_empty() {
            return fail("Access key and secret key cannot be empty");
        }
        if self.bucket_name.len() < 3 || self.bucket_name.len() > 63 {
            return fail("Bucket name must be between 3 and 63 characters");
        }
        if !self.bucket_name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.') {
            return fail("Bucket name contains invalid characters");
        }
        if self.image_folder.trim_matches('/').is_empty() {
            return fail("Image folder cannot be empty");
        }
        Ok(())
    }

    /// Get the full endpoint URL with protocol
    pub fn get_endpoint_url(&self) -> String {
        let protocol = if self.secure { "https" } else { "http" };
        format!("{}://{}", protocol, self.endpoint)
    }
}

impl Default for MinioConfig {
    fn default() -> Self {
        Self {
            endpoint: "localhost:9000".to_string(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            bucket_name: "profile-images".to_string(),
            links_prefix: "http://127.0.0.1:9000".to_string(),
            image_folder: "users".to_string(),
            region: "us-east-1".to_string(),
            secure: false,
        }
    }
}
