use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error, info};

use crate::config::{parsed_var, required_var, ConfigError};

/// MongoDB configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    /// MongoDB connection URI
    pub uri: String,
    /// Database name
    pub database: String,
    /// Username for authentication (optional)
    pub username: Option<String>,
    /// Password for authentication (optional)
    pub password: Option<String>,
    /// Collection holding user records
    pub user_collection: String,
    /// Connection pool size
    pub pool_size: u32,
    /// Connect and server selection timeout in seconds
    pub connection_timeout_secs: u64,
}

impl MongoConfig {
    /// Load MongoDB configuration from environment variables
    ///
    /// Expected environment variables:
    /// - MONGO_URI: MongoDB connection URI (required)
    /// - MONGO_DATABASE: Database name (required)
    /// - MONGO_USERNAME / MONGO_PASSWORD: Credentials (optional)
    /// - MONGO_USER_COLLECTION: Collection for users (defaults to "users")
    /// - MONGO_POOL_SIZE: Connection pool size (defaults to 10)
    /// - MONGO_CONNECTION_TIMEOUT: Timeout in seconds (defaults to 5)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading MongoDB configuration from environment variables");

        let uri = required_var("MONGO_URI")?;
        let database = required_var("MONGO_DATABASE")?;
        let username = env::var("MONGO_USERNAME").ok();
        let password = env::var("MONGO_PASSWORD").ok();
        let user_collection = parsed_var("MONGO_USER_COLLECTION", "users".to_string())?;
        let pool_size = parsed_var("MONGO_POOL_SIZE", 10u32)?;
        let connection_timeout_secs = parsed_var("MONGO_CONNECTION_TIMEOUT", 5u64)?;

        debug!(
            database = %database,
            collection = %user_collection,
            has_credentials = username.is_some() && password.is_some(),
            pool_size,
            connection_timeout_secs,
            "MongoDB settings read"
        );

        let config = MongoConfig {
            uri,
            database,
            username,
            password,
            user_collection,
            pool_size,
            connection_timeout_secs,
        };

        config.validate()?;
        info!("MongoDB configuration loaded successfully");
        Ok(config)
    }

    /// Create MongoConfig for testing
    pub fn from_test_env() -> Self {
        MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "test_db".to_string(),
            username: None,
            password: None,
            user_collection: "test_users".to_string(),
            pool_size: 2,
            connection_timeout_secs: 2,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let problem = if self.uri.is_empty() {
            Some("MongoDB URI cannot be empty")
        } else if self.database.is_empty() {
            Some("MongoDB database cannot be empty")
        } else if self.user_collection.is_empty() {
            Some("MongoDB user collection cannot be empty")
        } else if self.pool_size == 0 {
            Some("MongoDB pool size must be greater than 0")
        } else if self.connection_timeout_secs == 0 {
            Some("MongoDB connection timeout must be greater than 0")
        } else if self.username.as_deref() == Some("") {
            Some("MongoDB username cannot be empty if set")
        } else if self.password.as_deref() == Some("") {
            Some("MongoDB password cannot be empty if set")
        } else {
            None
        };

        match problem {
            Some(msg) => {
                error!("{}", msg);
                Err(ConfigError::ValidationError(msg.to_string()))
            }
            None => Ok(()),
        }
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "user_directory".to_string(),
            username: None,
            password: None,
            user_collection: "users".to_string(),
            pool_size: 10,
            connection_timeout_secs: 5,
        }
    }
}
