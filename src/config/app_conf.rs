use std::env;
use std::fmt;
use std::str::FromStr;

use crate::config::{parsed_var, ConfigError};

pub const DEFAULT_PROFILE_IMAGE: &str =
    "https://res.cloudinary.com/demo/image/upload/v1734567890/default-avatar.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StorageBackend::Mongo),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::InvalidValue(format!("Unknown storage backend: {}", other))),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Mongo => write!(f, "mongo"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_backend: StorageBackend,
    /// Shown for users without an uploaded profile image
    pub default_profile_image: String,
    /// Request body limit, which bounds the profile image size
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parsed_var("APP_PORT", 8000u16)?;
        let storage_backend = parsed_var("STORAGE_BACKEND", StorageBackend::Mongo)?;
        let default_profile_image =
            env::var("DEFAULT_PROFILE_IMAGE").unwrap_or_else(|_| DEFAULT_PROFILE_IMAGE.to_string());
        let max_upload_bytes = parsed_var("MAX_UPLOAD_BYTES", 5 * 1024 * 1024usize)?;
        if max_upload_bytes == 0 {
            return Err(ConfigError::ValidationError("MAX_UPLOAD_BYTES must be greater than 0".to_string()));
        }
        Ok(AppConfig { host, port, storage_backend, default_profile_image, max_upload_bytes })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
            storage_backend: StorageBackend::Mongo,
            default_profile_image: DEFAULT_PROFILE_IMAGE.to_string(),
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}
