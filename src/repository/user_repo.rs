use crate::config::mongo_conf::MongoConfig;
use crate::model::user::{User, UserStatus, UserUpdate};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use crate::repository::user_filter::UserFilter;
use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use futures::stream::TryStreamExt;
use mongodb::options::{
    FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument,
};
use mongodb::IndexModel;
use tracing::{debug, error, info, instrument};

/// Storage collaborator for user records.
///
/// Email uniqueness is enforced here; a conflicting insert or update fails
/// with [`RepositoryError::AlreadyExists`].
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Assigns a fresh id and both timestamps, then stores the user.
    async fn insert(&self, user: User) -> RepositoryResult<User>;
    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<User>>;
    /// Returns the updated record, or `NotFound`.
    async fn update(&self, id: &ObjectId, changes: UserUpdate) -> RepositoryResult<User>;
    async fn update_status(&self, id: &ObjectId, status: UserStatus) -> RepositoryResult<User>;
    async fn delete(&self, id: &ObjectId) -> RepositoryResult<()>;
    /// Matching records ordered by `createdAt` descending, ties in insertion order.
    async fn find_matching(&self, filter: &UserFilter, skip: u64, limit: u64) -> RepositoryResult<Vec<User>>;
    async fn count_matching(&self, filter: &UserFilter) -> RepositoryResult<u64>;
    /// Every record in natural storage order.
    async fn find_all(&self) -> RepositoryResult<Vec<User>>;
}

pub struct MongoUserRepository {
    collection: mongodb::Collection<User>,
}

impl MongoUserRepository {
    /// Connect using `MongoConfig` and make sure the unique email index exists.
    pub async fn new(config: &MongoConfig) -> Result<Self, mongodb::error::Error> {
        use mongodb::{options::{ClientOptions, Credential, ResolverConfig}, Client};

        let mut client_options = ClientOptions::parse_with_resolver_config(&config.uri, ResolverConfig::cloudflare()).await?;
        client_options.app_name = Some("UserDirectoryBackend".to_string());
        client_options.max_pool_size = Some(config.pool_size);
        client_options.connect_timeout = Some(std::time::Duration::from_secs(config.connection_timeout_secs));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(config.connection_timeout_secs));

        if let (Some(ref username), Some(ref password)) = (&config.username, &config.password) {
            client_options.credential = Some(Credential::builder()
                .username(username.clone())
                .password(password.clone())
                .build());
        }

        let client = Client::with_options(client_options)?;
        let db = client.database(&config.database);
        let collection = db.collection::<User>(&config.user_collection);
        let repo = MongoUserRepository { collection };
        repo.ensure_indexes().await?;
        Ok(repo)
    }

    async fn ensure_indexes(&self) -> Result<(), mongodb::error::Error> {
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(email_index, None).await?;
        info!("Unique email index ensured");
        Ok(())
    }

    fn set_document(changes: &UserUpdate, now: DateTime<Utc>) -> Document {
        let mut set = Document::new();
        if let Some(ref v) = changes.first_name {
            set.insert("firstName", v.as_str());
        }
        if let Some(ref v) = changes.last_name {
            set.insert("lastName", v.as_str());
        }
        if let Some(ref v) = changes.email {
            set.insert("email", v.as_str());
        }
        if let Some(ref v) = changes.mobile {
            set.insert("mobile", v.as_str());
        }
        if let Some(v) = changes.gender {
            set.insert("gender", v.as_str());
        }
        if let Some(v) = changes.user_status {
            set.insert("userStatus", v.as_str());
        }
        if let Some(ref v) = changes.profile_image {
            set.insert("profileImage", v.as_str());
        }
        if let Some(ref v) = changes.location {
            set.insert("location", v.as_str());
        }
        set.insert("updatedAt", bson::DateTime::from_chrono(now));
        set
    }

    async fn apply_update(&self, id: &ObjectId, set: Document) -> RepositoryResult<User> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .collection
            .find_one_and_update(doc! { "_id": *id }, doc! { "$set": set }, options)
            .await
            .map_err(|e| {
                error!("Failed to update user {}: {}", id, e);
                RepositoryError::from(e)
            })?;
        match updated {
            Some(user) => {
                info!("User {} updated", id);
                Ok(user)
            }
            None => {
                error!("No user found to update for ID: {}", id);
                Err(RepositoryError::not_found(format!("No user found to update for ID: {}", id)))
            }
        }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn insert(&self, mut user: User) -> RepositoryResult<User> {
        user.id = Some(ObjectId::new());
        let now = Utc::now();
        user.created_at = now;
        user.updated_at = now;
        match self.collection.insert_one(&user, None).await {
            Ok(_) => {
                info!("User inserted");
                Ok(user)
            }
            Err(e) => {
                error!("Failed to insert user: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<User>> {
        let user = self
            .collection
            .find_one(doc! { "_id": *id }, None)
            .await
            .map_err(RepositoryError::from)?;
        debug!(found = user.is_some(), "Looked up user by id");
        Ok(user)
    }

    #[instrument(skip(self, changes), fields(id = %id))]
    async fn update(&self, id: &ObjectId, changes: UserUpdate) -> RepositoryResult<User> {
        let set = Self::set_document(&changes, Utc::now());
        self.apply_update(id, set).await
    }

    #[instrument(skip(self), fields(id = %id, status = status.as_str()))]
    async fn update_status(&self, id: &ObjectId, status: UserStatus) -> RepositoryResult<User> {
        let changes = UserUpdate { user_status: Some(status), ..Default::default() };
        let set = Self::set_document(&changes, Utc::now());
        self.apply_update(id, set).await
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: &ObjectId) -> RepositoryResult<()> {
        let result = self.collection.delete_one(doc! { "_id": *id }, None).await;
        match result {
            Ok(delete_result) if delete_result.deleted_count > 0 => {
                info!("User deleted successfully for ID: {}", id);
                Ok(())
            }
            Ok(_) => {
                error!("No user found to delete for ID: {}", id);
                Err(RepositoryError::not_found(format!("No user found to delete for ID: {}", id)))
            }
            Err(e) => {
                error!("Failed to delete user: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[instrument(skip(self), fields(search = ?filter.term(), skip = skip, limit = limit))]
    async fn find_matching(&self, filter: &UserFilter, skip: u64, limit: u64) -> RepositoryResult<Vec<User>> {
        let limit = i64::try_from(limit)
            .map_err(|_| RepositoryError::ValidationError(format!("Limit out of range: {}", limit)))?;
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1, "_id": 1 })
            .skip(skip)
            .limit(limit)
            .build();
        let cursor = self
            .collection
            .find(filter.to_document(), options)
            .await
            .map_err(|e| {
                error!("Failed to query users: {}", e);
                RepositoryError::from(e)
            })?;
        let users: Vec<User> = cursor.try_collect().await.map_err(RepositoryError::from)?;
        debug!("Fetched {} users", users.len());
        Ok(users)
    }

    #[instrument(skip(self), fields(search = ?filter.term()))]
    async fn count_matching(&self, filter: &UserFilter) -> RepositoryResult<u64> {
        let count = self
            .collection
            .count_documents(filter.to_document(), None)
            .await
            .map_err(|e| {
                error!("Failed to count users: {}", e);
                RepositoryError::from(e)
            })?;
        debug!("Matching users: {}", count);
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn find_all(&self) -> RepositoryResult<Vec<User>> {
        let cursor = self.collection.find(None, None).await.map_err(RepositoryError::from)?;
        let users: Vec<User> = cursor.try_collect().await.map_err(RepositoryError::from)?;
        info!("Fetched all {} users", users.len());
        Ok(users)
    }
}
