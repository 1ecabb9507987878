use async_trait::async_trait;
use axum::body::to_bytes;
use axum::{body::Body, http::{header, Request, StatusCode}, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt; // for .oneshot()
use user_directory_backend::app::app::build_router;
use user_directory_backend::config::app_conf::DEFAULT_PROFILE_IMAGE;
use user_directory_backend::repository::memory_user_repo::InMemoryUserRepository;
use user_directory_backend::service::user_service::UserServiceImpl;
use user_directory_backend::util::image_store::{
    DisabledImageStore, ImageStore, ImageStoreError, StoredImage, UploadedFile,
};

const BOUNDARY: &str = "X-BOUNDARY";

/// Accepts every upload and remembers what went in and out.
#[derive(Default)]
struct RecordingImageStore {
    uploaded: Mutex<Vec<String>>,
    removed: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageStore for RecordingImageStore {
    async fn upload(&self, file: UploadedFile) -> Result<StoredImage, ImageStoreError> {
        let key = format!("users/{}", file.filename);
        self.uploaded.lock().unwrap().push(key.clone());
        Ok(StoredImage { url: format!("http://images.test/{}", key), key })
    }

    async fn remove(&self, key: &str) -> Result<(), ImageStoreError> {
        self.removed.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

fn test_app_with_store(store: Arc<dyn ImageStore>) -> Router {
    let repo = Arc::new(InMemoryUserRepository::new());
    let service = Arc::new(UserServiceImpl::new(repo, store, DEFAULT_PROFILE_IMAGE.to_string()));
    build_router(service, 1024 * 1024)
}

fn test_app() -> (Router, Arc<RecordingImageStore>) {
    let store = Arc::new(RecordingImageStore::default());
    (test_app_with_store(store.clone()), store)
}

struct FilePart<'a> {
    field: &'a str,
    filename: &'a str,
    content_type: &'a str,
    content: &'a [u8],
}

fn multipart_body(fields: &[(&str, &str)], file: Option<FilePart>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend(
            format!("--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n", BOUNDARY, name, value)
                .as_bytes(),
        );
    }
    if let Some(file) = file {
        body.extend(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, file.field, file.filename, file.content_type
            )
            .as_bytes(),
        );
        body.extend(file.content);
        body.extend(b"\r\n");
    }
    body.extend(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_request(method: &str, uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body_bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
    (status, body)
}

fn user_fields<'a>(first: &'a str, email: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("firstName", first),
        ("lastName", "Lee"),
        ("email", email),
        ("mobile", "0550000000"),
        ("gender", "Female"),
        ("location", "Annville"),
    ]
}

async fn create_user(app: &Router, first: &str, email: &str) -> Value {
    let body = multipart_body(&user_fields(first, email), None);
    let (status, json) = send(app, multipart_request("POST", "/api/users", body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", json);
    json
}

#[tokio::test]
async fn test_health() {
    let (app, _) = test_app();
    let resp = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_user_without_image_uses_default() {
    let (app, store) = test_app();
    let json = create_user(&app, "Ann", "ann@x.io").await;

    assert_eq!(json["firstName"], "Ann");
    assert_eq!(json["email"], "ann@x.io");
    assert_eq!(json["gender"], "Female");
    assert_eq!(json["userStatus"], "Active");
    assert_eq!(json["profileImage"], DEFAULT_PROFILE_IMAGE);
    assert_eq!(json["_id"].as_str().map(|s| s.len()), Some(24));
    assert!(store.uploaded.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_user_with_image() {
    let (app, store) = test_app();
    let file = FilePart { field: "profileImage", filename: "ann.png", content_type: "image/png", content: b"\x89PNG" };
    let body = multipart_body(&user_fields("Ann", "ann@x.io"), Some(file));
    let (status, json) = send(&app, multipart_request("POST", "/api/users", body)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["profileImage"], "http://images.test/users/ann.png");
    assert_eq!(store.uploaded.lock().unwrap().as_slice(), ["users/ann.png"]);
}

#[tokio::test]
async fn test_create_user_rejects_non_image_file() {
    let (app, store) = test_app();
    let file = FilePart { field: "profileImage", filename: "notes.txt", content_type: "text/plain", content: b"hello" };
    let body = multipart_body(&user_fields("Ann", "ann@x.io"), Some(file));
    let (status, json) = send(&app, multipart_request("POST", "/api/users", body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "BadRequest");
    assert!(store.uploaded.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_user_rejects_unexpected_file_field() {
    let (app, _) = test_app();
    let file = FilePart { field: "avatar", filename: "a.png", content_type: "image/png", content: b"png" };
    let body = multipart_body(&user_fields("Ann", "ann@x.io"), Some(file));
    let (status, _) = send(&app, multipart_request("POST", "/api/users", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_user_with_invalid_email_is_validation_error() {
    let (app, _) = test_app();
    let body = multipart_body(&user_fields("Ann", "not-an-email"), None);
    let (status, json) = send(&app, multipart_request("POST", "/api/users", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Validation");
}

#[tokio::test]
async fn test_create_user_missing_field_is_bad_request() {
    let (app, _) = test_app();
    let body = multipart_body(&[("firstName", "Ann"), ("email", "ann@x.io")], None);
    let (status, _) = send(&app, multipart_request("POST", "/api/users", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_user_duplicate_email_conflicts_and_discards_image() {
    let (app, store) = test_app();
    create_user(&app, "Ann", "ann@x.io").await;

    let file = FilePart { field: "profileImage", filename: "dup.png", content_type: "image/png", content: b"png" };
    let body = multipart_body(&user_fields("Other", "ann@x.io"), Some(file));
    let (status, json) = send(&app, multipart_request("POST", "/api/users", body)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["message"], "Email already exists");
    assert_eq!(store.removed.lock().unwrap().as_slice(), ["users/dup.png"]);
}

#[tokio::test]
async fn test_create_user_with_image_when_store_disabled() {
    let app = test_app_with_store(Arc::new(DisabledImageStore));
    let file = FilePart { field: "profileImage", filename: "ann.png", content_type: "image/png", content: b"png" };
    let body = multipart_body(&user_fields("Ann", "ann@x.io"), Some(file));
    let (status, _) = send(&app, multipart_request("POST", "/api/users", body)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_get_user() {
    let (app, _) = test_app();
    let created = create_user(&app, "Ann", "ann@x.io").await;
    let id = created["_id"].as_str().unwrap();

    let (status, json) = send(&app, get(&format!("/api/users/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, created);
}

#[tokio::test]
async fn test_get_user_not_found_and_bad_id() {
    let (app, _) = test_app();
    let (status, json) = send(&app, get("/api/users/65a1b2c3d4e5f60718293a4b")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "User not found");

    let (status, _) = send(&app, get("/api/users/not-an-id")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_user_with_json() {
    let (app, _) = test_app();
    let created = create_user(&app, "Ann", "ann@x.io").await;
    let id = created["_id"].as_str().unwrap();

    let req = json_request("PUT", &format!("/api/users/{}", id), json!({ "location": "Oran", "mobile": "0661111111" }));
    let (status, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["location"], "Oran");
    assert_eq!(json["mobile"], "0661111111");
    assert_eq!(json["firstName"], "Ann");
    assert_eq!(json["createdAt"], created["createdAt"]);
}

#[tokio::test]
async fn test_update_user_with_multipart_image() {
    let (app, store) = test_app();
    let created = create_user(&app, "Ann", "ann@x.io").await;
    let id = created["_id"].as_str().unwrap();

    let file = FilePart { field: "profileImage", filename: "new.jpg", content_type: "image/jpeg", content: b"jpg" };
    let body = multipart_body(&[("lastName", "Smith")], Some(file));
    let (status, json) = send(&app, multipart_request("PUT", &format!("/api/users/{}", id), body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["lastName"], "Smith");
    assert_eq!(json["profileImage"], "http://images.test/users/new.jpg");
    assert_eq!(store.uploaded.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_user_email_to_existing_conflicts() {
    let (app, _) = test_app();
    create_user(&app, "Ann", "ann@x.io").await;
    let bob = create_user(&app, "Bob", "bob@y.io").await;
    let id = bob["_id"].as_str().unwrap();

    let req = json_request("PUT", &format!("/api/users/{}", id), json!({ "email": "ann@x.io" }));
    let (status, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["message"], "Email already exists");
}

#[tokio::test]
async fn test_update_missing_user_is_not_found() {
    let (app, _) = test_app();
    let req = json_request("PUT", "/api/users/65a1b2c3d4e5f60718293a4b", json!({ "location": "Oran" }));
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_user_status() {
    let (app, _) = test_app();
    let created = create_user(&app, "Ann", "ann@x.io").await;
    let id = created["_id"].as_str().unwrap();

    let req = json_request("PATCH", &format!("/api/users/{}/status", id), json!({ "userStatus": "Inactive" }));
    let (status, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["userStatus"], "Inactive");

    let req = json_request("PATCH", &format!("/api/users/{}/status", id), json!({ "userStatus": "Suspended" }));
    let resp = app.clone().oneshot(req).await.unwrap();
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn test_delete_user() {
    let (app, _) = test_app();
    let created = create_user(&app, "Ann", "ann@x.io").await;
    let uri = format!("/api/users/{}", created["_id"].as_str().unwrap());

    let delete = || Request::builder().method("DELETE").uri(&uri).body(Body::empty()).unwrap();
    let (status, json) = send(&app, delete()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "User deleted successfully");

    let (status, _) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, delete()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_users_defaults_and_search() {
    let (app, _) = test_app();
    create_user(&app, "Ann", "ann@x.io").await;
    create_user(&app, "Bob", "bob@y.io").await;

    let (status, json) = send(&app, get("/api/users")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 2);
    assert_eq!(json["page"], 1);
    assert_eq!(json["limit"], 10);
    assert_eq!(json["totalPages"], 1);
    assert_eq!(json["users"].as_array().unwrap().len(), 2);

    let (status, json) = send(&app, get("/api/users?search=BOB&page=1&limit=5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 1);
    assert_eq!(json["users"][0]["firstName"], "Bob");
}

#[tokio::test]
async fn test_list_users_pagination() {
    let (app, _) = test_app();
    for n in 0..5 {
        create_user(&app, &format!("User{}", n), &format!("user{}@example.com", n)).await;
    }

    let (_, first) = send(&app, get("/api/users?page=1&limit=2")).await;
    let (_, third) = send(&app, get("/api/users?page=3&limit=2")).await;
    let (_, beyond) = send(&app, get("/api/users?page=9&limit=2")).await;

    assert_eq!(first["total"], 5);
    assert_eq!(first["totalPages"], 3);
    assert_eq!(first["users"].as_array().unwrap().len(), 2);
    assert_eq!(third["users"].as_array().unwrap().len(), 1);
    assert_eq!(beyond["users"].as_array().unwrap().len(), 0);
    assert_eq!(beyond["total"], 5);
}

#[tokio::test]
async fn test_list_users_rejects_bad_paging() {
    let (app, _) = test_app();
    for uri in ["/api/users?page=0", "/api/users?limit=0", "/api/users?limit=101", "/api/users?page=abc"] {
        let (status, json) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(json["message"].is_string());
    }
}

#[tokio::test]
async fn test_export_users_csv() {
    let (app, _) = test_app();
    create_user(&app, "Ann", "ann@x.io").await;
    create_user(&app, "Bob", "bob@y.io").await;

    let resp = app.clone().oneshot(get("/api/users/export/csv")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/csv"));
    assert!(disposition.contains("users.csv"));

    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "ID,First Name,Last Name,Email,Mobile,Gender,Status,Location,Created At");
    assert_eq!(lines.len(), 3);
    assert!(text.contains("ann@x.io"));
}

#[tokio::test]
async fn test_create_user_ignores_empty_file_part() {
    let (app, store) = test_app();
    // what a browser sends when the file input is left empty
    let file = FilePart { field: "profileImage", filename: "", content_type: "application/octet-stream", content: b"" };
    let body = multipart_body(&user_fields("Ann", "ann@x.io"), Some(file));
    let (status, json) = send(&app, multipart_request("POST", "/api/users", body)).await;

    assert_eq!(status, StatusCode::CREATED, "{}", json);
    assert_eq!(json["profileImage"], DEFAULT_PROFILE_IMAGE);
    assert!(store.uploaded.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_user_keeps_image_url_sent_as_text() {
    let (app, store) = test_app();
    let file = FilePart { field: "profileImage", filename: "old.png", content_type: "image/png", content: b"png" };
    let body = multipart_body(&user_fields("Ann", "ann@x.io"), Some(file));
    let (_, created) = send(&app, multipart_request("POST", "/api/users", body)).await;
    let id = created["_id"].as_str().unwrap();
    assert_eq!(created["profileImage"], "http://images.test/users/old.png");

    let body = multipart_body(&[("firstName", "Annie"), ("profileImage", "http://images.test/users/old.png")], None);
    let (status, json) = send(&app, multipart_request("PUT", &format!("/api/users/{}", id), body)).await;

    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["firstName"], "Annie");
    assert_eq!(json["profileImage"], "http://images.test/users/old.png");
    assert_eq!(store.uploaded.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_user_rejects_text_image_that_is_not_a_url() {
    let (app, _) = test_app();
    let created = create_user(&app, "Ann", "ann@x.io").await;
    let id = created["_id"].as_str().unwrap();

    let body = multipart_body(&[("profileImage", "not a url")], None);
    let (status, json) = send(&app, multipart_request("PUT", &format!("/api/users/{}", id), body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Validation");
    assert!(json["details"].is_string());
}

#[tokio::test]
async fn test_update_user_json_blank_fields_are_ignored_like_form_fields() {
    let (app, _) = test_app();
    let created = create_user(&app, "Ann", "ann@x.io").await;
    let id = created["_id"].as_str().unwrap();

    let req = json_request("PUT", &format!("/api/users/{}", id), json!({ "firstName": "   ", "lastName": " Smith " }));
    let (status, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["firstName"], "Ann");
    assert_eq!(json["lastName"], "Smith");
}
