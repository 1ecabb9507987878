pub mod repository_error;
pub mod user_filter;
pub mod user_repo;
pub mod memory_user_repo;
