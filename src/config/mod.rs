pub mod app_conf;
pub mod minio_conf;
pub mod mongo_conf;

pub use app_conf::{AppConfig, StorageBackend};
pub use minio_conf::MinioConfig;
pub use mongo_conf::MongoConfig;

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use tracing::{error, warn};

/// Common configuration error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Read a variable that has no sensible default.
pub(crate) fn required_var(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| {
        error!("{} environment variable not found", name);
        ConfigError::EnvVarNotFound(name.to_string())
    })
}

/// Read and parse a variable, falling back to `default` when it is unset.
pub(crate) fn parsed_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| {
            error!("Invalid {} value: {}", name, raw);
            ConfigError::InvalidValue(format!("Invalid {} value: {}", name, raw))
        }),
        Err(_) => {
            warn!("{} not set, using default: {}", name, default);
            Ok(default)
        }
    }
}
