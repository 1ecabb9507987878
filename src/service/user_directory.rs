//! Paginated search over the user directory, plus the full CSV export.
//!
//! Each call is independent: nothing is cached between queries, and storage
//! errors are handed back unchanged (no retries, no partial pages).

use crate::model::user::User;
use crate::repository::user_filter::UserFilter;
use crate::repository::user_repo::UserRepository;
use crate::util::csv_export::users_to_csv;
use crate::util::error::ServiceError;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u64 = 100;

/// One page of matching users.
#[derive(Debug, Clone, PartialEq)]
pub struct UserPage {
    /// Newest first
    pub records: Vec<User>,
    /// Matches across all pages
    pub total_count: u64,
    pub page: u64,
    pub page_size: u64,
}

impl UserPage {
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(self.page_size)
    }
}

#[derive(Clone)]
pub struct UserDirectoryQuery {
    user_repo: Arc<dyn UserRepository>,
}

impl UserDirectoryQuery {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    /// Records whose first name, last name, email or location contain
    /// `search_term` (case-insensitive), newest first, sliced to `page`.
    #[instrument(skip(self))]
    pub async fn query(&self, search_term: &str, page: u64, page_size: u64) -> Result<UserPage, ServiceError> {
        let skip = Self::skip_for(page, page_size)?;
        let filter = UserFilter::search(search_term);

        let records = self.user_repo.find_matching(&filter, skip, page_size).await.map_err(|e| {
            error!("Failed to fetch user page: {e}");
            ServiceError::from(e)
        })?;
        let total_count = self.user_repo.count_matching(&filter).await.map_err(|e| {
            error!("Failed to count matching users: {e}");
            ServiceError::from(e)
        })?;

        info!(returned = records.len(), total_count, "User directory query served");
        Ok(UserPage { records, total_count, page, page_size })
    }

    /// Every stored user as CSV, in storage order.
    #[instrument(skip(self))]
    pub async fn export_all(&self) -> Result<Vec<u8>, ServiceError> {
        let users = self.user_repo.find_all().await.map_err(|e| {
            error!("Failed to load users for export: {e}");
            ServiceError::from(e)
        })?;
        let bytes = users_to_csv(&users).map_err(|e| ServiceError::InternalError(e.to_string()))?;
        info!(rows = users.len(), bytes = bytes.len(), "Users exported to CSV");
        Ok(bytes)
    }

    fn skip_for(page: u64, page_size: u64) -> Result<u64, ServiceError> {
        if page < 1 {
            return Err(ServiceError::InvalidInput("page must be at least 1".to_string()));
        }
        if page_size < 1 {
            return Err(ServiceError::InvalidInput("limit must be at least 1".to_string()));
        }
        if page_size > MAX_PAGE_SIZE {
            return Err(ServiceError::InvalidInput(format!("limit must not exceed {}", MAX_PAGE_SIZE)));
        }
        let skip = (page - 1)
            .checked_mul(page_size)
            .ok_or_else(|| ServiceError::InvalidInput("page is out of range".to_string()))?;
        debug!(skip, "Computed page offset");
        Ok(skip)
    }
}
