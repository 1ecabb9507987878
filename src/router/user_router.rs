use axum::{Router, routing::{get, patch}};
use crate::handler::user_handler::{
    create_user_handler,
    list_users_handler,
    get_user_handler,
    update_user_handler,
    update_user_status_handler,
    delete_user_handler,
    export_users_csv_handler,
};
use std::sync::Arc;
use crate::service::user_service::UserServiceImpl;

pub fn user_router(service: Arc<UserServiceImpl>) -> Router {
    Router::new()
        .route("/api/users", get(list_users_handler).post(create_user_handler))
        // static segment, matched ahead of the {id} capture
        .route("/api/users/export/csv", get(export_users_csv_handler))
        .route(
            "/api/users/{id}",
            get(get_user_handler).put(update_user_handler).delete(delete_user_handler),
        )
        .route("/api/users/{id}/status", patch(update_user_status_handler))
        .with_state(service)
}
