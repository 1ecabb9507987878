use crate::model::user::{User, UserStatus, UserUpdate};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use crate::repository::user_filter::UserFilter;
use crate::repository::user_repo::UserRepository;
use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Process-local user store, kept in insertion order.
///
/// Selected with `STORAGE_BACKEND=memory`; also backs the integration tests.
///
/// Search matching lowercases both sides with `str::to_lowercase`, while
/// MongoDB uses `$regex` with the `i` option. The two can disagree on some
/// Unicode case folds (e.g. `ß` / `SS`); ASCII behaves the same.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing records, stored as given (ids and timestamps kept).
    pub fn with_users(users: Vec<User>) -> Self {
        InMemoryUserRepository { users: RwLock::new(users) }
    }

    fn email_taken(users: &[User], email: &str, except: Option<&ObjectId>) -> bool {
        users
            .iter()
            .any(|u| u.email == email && u.id.as_ref() != except)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, mut user: User) -> RepositoryResult<User> {
        let mut users = self.users.write().await;
        if Self::email_taken(&users, &user.email, None) {
            return Err(RepositoryError::already_exists(format!("Duplicate key: email {}", user.email)));
        }
        user.id = Some(ObjectId::new());
        let now = Utc::now();
        user.created_at = now;
        user.updated_at = now;
        users.push(user.clone());
        info!("User inserted in memory");
        Ok(user)
    }

    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id.as_ref() == Some(id)).cloned())
    }

    async fn update(&self, id: &ObjectId, changes: UserUpdate) -> RepositoryResult<User> {
        let mut users = self.users.write().await;
        if let Some(ref email) = changes.email {
            if Self::email_taken(&users, email, Some(id)) {
                return Err(RepositoryError::already_exists(format!("Duplicate key: email {}", email)));
            }
        }
        let user = users
            .iter_mut()
            .find(|u| u.id.as_ref() == Some(id))
            .ok_or_else(|| RepositoryError::not_found(format!("No user found to update for ID: {}", id)))?;
        changes.apply_to(user, Utc::now());
        Ok(user.clone())
    }

    async fn update_status(&self, id: &ObjectId, status: UserStatus) -> RepositoryResult<User> {
        let changes = UserUpdate { user_status: Some(status), ..Default::default() };
        self.update(id, changes).await
    }

    async fn delete(&self, id: &ObjectId) -> RepositoryResult<()> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id.as_ref() != Some(id));
        if users.len() == before {
            return Err(RepositoryError::not_found(format!("No user found to delete for ID: {}", id)));
        }
        Ok(())
    }

    async fn find_matching(&self, filter: &UserFilter, skip: u64, limit: u64) -> RepositoryResult<Vec<User>> {
        let users = self.users.read().await;
        let mut matching: Vec<&User> = users.iter().filter(|u| filter.matches(u)).collect();
        // stable: equal timestamps keep insertion order
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let page: Vec<User> = matching.into_iter().skip(skip).take(limit).cloned().collect();
        debug!("Fetched {} users from memory", page.len());
        Ok(page)
    }

    async fn count_matching(&self, filter: &UserFilter) -> RepositoryResult<u64> {
        let users = self.users.read().await;
        Ok(users.iter().filter(|u| filter.matches(u)).count() as u64)
    }

    async fn find_all(&self) -> RepositoryResult<Vec<User>> {
        Ok(self.users.read().await.clone())
    }
}
