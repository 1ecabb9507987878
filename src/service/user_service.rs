use crate::dto::user_dto::{CreateUserRequest, UpdateUserRequest};
use crate::model::user::{User, UserStatus};
use crate::repository::user_repo::UserRepository;
use crate::service::user_directory::{UserDirectoryQuery, UserPage};
use crate::util::error::ServiceError;
use crate::util::image_store::{ImageStore, ImageStoreError, StoredImage, UploadedFile};
use async_trait::async_trait;
use bson::oid::ObjectId;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

#[async_trait]
pub trait UserService: Send + Sync {
    async fn add_user(&self, request: CreateUserRequest, image: Option<UploadedFile>) -> Result<User, ServiceError>;
    async fn get_user(&self, id: ObjectId) -> Result<User, ServiceError>;
    async fn update_user(&self, id: ObjectId, request: UpdateUserRequest, image: Option<UploadedFile>) -> Result<User, ServiceError>;
    async fn update_user_status(&self, id: ObjectId, status: UserStatus) -> Result<User, ServiceError>;
    async fn delete_user(&self, id: ObjectId) -> Result<(), ServiceError>;
    async fn list_users(&self, search: &str, page: u64, limit: u64) -> Result<UserPage, ServiceError>;
    async fn export_users_csv(&self) -> Result<Vec<u8>, ServiceError>;
}

pub struct UserServiceImpl {
    pub user_repo: Arc<dyn UserRepository>,
    pub image_store: Arc<dyn ImageStore>,
    pub directory: UserDirectoryQuery,
    pub default_profile_image: String,
}

impl UserServiceImpl {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        image_store: Arc<dyn ImageStore>,
        default_profile_image: String,
    ) -> Self {
        let directory = UserDirectoryQuery::new(user_repo.clone());
        Self { user_repo, image_store, directory, default_profile_image }
    }

    async fn store_image(&self, image: Option<UploadedFile>) -> Result<Option<StoredImage>, ServiceError> {
        let Some(file) = image else {
            return Ok(None);
        };
        info!(filename = %file.filename, size = file.size(), "Uploading profile image");
        match self.image_store.upload(file).await {
            Ok(stored) => Ok(Some(stored)),
            Err(ImageStoreError::Disabled) => Err(ServiceError::Unavailable(
                "Profile image uploads are not available".to_string(),
            )),
            Err(e) => {
                error!("Profile image upload failed: {e}");
                Err(ServiceError::InternalError(e.to_string()))
            }
        }
    }

    /// Drop an image whose record write failed. Failures are only logged.
    async fn discard_image(&self, stored: Option<StoredImage>) {
        if let Some(stored) = stored {
            if let Err(e) = self.image_store.remove(&stored.key).await {
                warn!(key = %stored.key, "Could not remove orphaned profile image: {e}");
            }
        }
    }
}

fn duplicate_email(err: ServiceError) -> ServiceError {
    match err {
        ServiceError::Conflict(_) => ServiceError::Conflict("Email already exists".to_string()),
        other => other,
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    #[instrument(skip(self, request, image), fields(email = %request.email))]
    async fn add_user(&self, request: CreateUserRequest, image: Option<UploadedFile>) -> Result<User, ServiceError> {
        info!("Adding new user");
        let stored = self.store_image(image).await?;
        let user = request.into_user(stored.as_ref().map(|s| s.url.clone()));

        match self.user_repo.insert(user).await {
            Ok(inserted) => {
                info!(id = ?inserted.id, "User added");
                Ok(inserted)
            }
            Err(e) => {
                error!("Failed to insert user: {e}");
                self.discard_image(stored).await;
                Err(duplicate_email(ServiceError::from(e)))
            }
        }
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn get_user(&self, id: ObjectId) -> Result<User, ServiceError> {
        self.user_repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }

    #[instrument(skip(self, request, image), fields(id = %id))]
    async fn update_user(&self, id: ObjectId, request: UpdateUserRequest, image: Option<UploadedFile>) -> Result<User, ServiceError> {
        info!("Updating user");
        let stored = self.store_image(image).await?;
        let changes = request.into_update(stored.as_ref().map(|s| s.url.clone()));

        match self.user_repo.update(&id, changes).await {
            Ok(updated) => {
                info!("User updated");
                Ok(updated)
            }
            Err(e) => {
                error!("Failed to update user: {e}");
                self.discard_image(stored).await;
                match ServiceError::from(e) {
                    ServiceError::NotFound(_) => Err(ServiceError::NotFound("User not found".to_string())),
                    other => Err(duplicate_email(other)),
                }
            }
        }
    }

    #[instrument(skip(self), fields(id = %id, status = status.as_str()))]
    async fn update_user_status(&self, id: ObjectId, status: UserStatus) -> Result<User, ServiceError> {
        // last write wins; no version check
        let res = self.user_repo.update_status(&id, status).await;
        match &res {
            Ok(_) => info!("User status updated"),
            Err(e) => error!("Failed to update user status: {e}"),
        }
        res.map_err(|e| match ServiceError::from(e) {
            ServiceError::NotFound(_) => ServiceError::NotFound("User not found".to_string()),
            other => other,
        })
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete_user(&self, id: ObjectId) -> Result<(), ServiceError> {
        let res = self.user_repo.delete(&id).await;
        match &res {
            Ok(_) => info!("User deleted"),
            Err(e) => error!("Failed to delete user: {e}"),
        }
        res.map_err(|e| match ServiceError::from(e) {
            ServiceError::NotFound(_) => ServiceError::NotFound("User not found".to_string()),
            other => other,
        })
    }

    async fn list_users(&self, search: &str, page: u64, limit: u64) -> Result<UserPage, ServiceError> {
        self.directory.query(search, page, limit).await
    }

    async fn export_users_csv(&self) -> Result<Vec<u8>, ServiceError> {
        self.directory.export_all().await
    }
}
