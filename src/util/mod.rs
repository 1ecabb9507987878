pub mod csv_export;
pub mod error;
pub mod image_store;
pub mod logger;
pub mod minio;
pub mod multipart;
