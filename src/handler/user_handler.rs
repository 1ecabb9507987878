use axum::{
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use crate::dto::user_dto::{
    CreateUserRequest, ListUsersQuery, MessageResponse, UpdateStatusRequest, UpdateUserRequest,
    UserListResponse, UserResponse,
};
use crate::service::user_service::{UserService, UserServiceImpl};
use crate::util::error::HandlerError;
use crate::util::multipart::read_user_form;
use bson::oid::ObjectId;
use std::sync::Arc;
use tracing::{error, info};
use validator::Validate;

fn parse_id(id: &str) -> Result<ObjectId, HandlerError> {
    ObjectId::parse_str(id).map_err(|_| HandlerError::bad_request("Invalid user id"))
}

fn validate<T: Validate>(payload: &T) -> Result<(), HandlerError> {
    payload
        .validate()
        .map_err(|e| HandlerError::validation("Validation error").with_details(e.to_string()))
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

// POST /api/users (multipart form, optional profileImage file)
pub async fn create_user_handler(
    State(service): State<Arc<UserServiceImpl>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HandlerError> {
    info!("[create_user_handler] Handler called");
    let form = read_user_form(multipart).await?;
    let payload: CreateUserRequest = form.parse_fields()?;
    validate(&payload)?;

    let created = service.add_user(payload, form.image).await?;
    let body = UserResponse::from_user(created, &service.default_profile_image);
    Ok((StatusCode::CREATED, Json(body)))
}

// GET /api/users?search=&page=&limit=
pub async fn list_users_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Query(params): Query<ListUsersQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let (search, page, limit) = params.parse().map_err(HandlerError::validation)?;
    let users = service.list_users(&search, page, limit).await?;
    Ok(Json(UserListResponse::from_page(users, &service.default_profile_image)))
}

// GET /api/users/{id}
pub async fn get_user_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id)?;
    let user = service.get_user(id).await?;
    Ok(Json(UserResponse::from_user(user, &service.default_profile_image)))
}

// PUT /api/users/{id} (multipart form or JSON with any subset of fields)
pub async fn update_user_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Path(id): Path<String>,
    request: Request,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id)?;

    let (payload, image) = if is_multipart(&request) {
        let multipart = Multipart::from_request(request, &()).await.map_err(|e| {
            error!("[update_user_handler] Bad multipart request: {}", e);
            HandlerError::bad_request(e.body_text())
        })?;
        let form = read_user_form(multipart).await?;
        let payload: UpdateUserRequest = form.parse_fields()?;
        (payload, form.image)
    } else {
        let Json(payload) = Json::<UpdateUserRequest>::from_request(request, &()).await.map_err(|e| {
            error!("[update_user_handler] Bad JSON body: {}", e);
            HandlerError::bad_request(e.body_text())
        })?;
        (payload, None)
    };
    validate(&payload)?;

    let updated = service.update_user(id, payload, image).await?;
    Ok(Json(UserResponse::from_user(updated, &service.default_profile_image)))
}

// PATCH /api/users/{id}/status
pub async fn update_user_status_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id)?;
    let updated = service.update_user_status(id, payload.user_status).await?;
    Ok(Json(UserResponse::from_user(updated, &service.default_profile_image)))
}

// DELETE /api/users/{id}
pub async fn delete_user_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id)?;
    service.delete_user(id).await?;
    Ok(Json(MessageResponse { message: "User deleted successfully".to_string() }))
}

// GET /api/users/export/csv
pub async fn export_users_csv_handler(
    State(service): State<Arc<UserServiceImpl>>,
) -> Result<impl IntoResponse, HandlerError> {
    let csv = service.export_users_csv().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"users.csv\""),
        ],
        csv,
    ))
}
