use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::{info, warn};

use crate::config::{AppConfig, MinioConfig, MongoConfig, StorageBackend};
use crate::repository::memory_user_repo::InMemoryUserRepository;
use crate::repository::user_repo::{MongoUserRepository, UserRepository};
use crate::router::user_router::user_router;
use crate::service::user_service::UserServiceImpl;
use crate::util::image_store::{DisabledImageStore, ImageStore};
use crate::util::minio::MinioService;

pub struct App {
    config: AppConfig,
    router: Router,
    pub user_service: Arc<UserServiceImpl>,
}

/// Full HTTP surface: user routes, `/health`, CORS, request tracing and the upload limit.
pub fn build_router(service: Arc<UserServiceImpl>, max_upload_bytes: usize) -> Router {
    Router::new()
        .merge(user_router(service))
        .route("/health", get(|| async { "OK" }))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::new().include_headers(false)))
}

impl App {
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let config = AppConfig::from_env()?;
        info!(backend = %config.storage_backend, "Selecting user storage");

        let user_repo: Arc<dyn UserRepository> = match config.storage_backend {
            StorageBackend::Mongo => {
                let mongo_config = MongoConfig::from_env()?;
                Arc::new(MongoUserRepository::new(&mongo_config).await?)
            }
            StorageBackend::Memory => {
                warn!("Using in-memory user storage, records are lost on restart");
                Arc::new(InMemoryUserRepository::new())
            }
        };

        let image_store: Arc<dyn ImageStore> = match MinioConfig::from_env() {
            Ok(minio_config) => Arc::new(MinioService::new(minio_config).await?),
            Err(e) => {
                warn!("MinIO not configured ({e}), profile image uploads are disabled");
                Arc::new(DisabledImageStore)
            }
        };

        let user_service = Arc::new(UserServiceImpl::new(
            user_repo,
            image_store,
            config.default_profile_image.clone(),
        ));
        let router = build_router(user_service.clone(), config.max_upload_bytes);
        Ok(App { config, router, user_service })
    }

    pub async fn start(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = SocketAddr::new(self.config.host.parse()?, self.config.port);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("🚀 Server running at http://{}", addr);
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}
