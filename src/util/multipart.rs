use crate::util::error::{HandlerError, HandlerErrorKind};
use crate::util::image_store::UploadedFile;
use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, error, info};

/// Name of the single file field accepted on user forms.
pub const PROFILE_IMAGE_FIELD: &str = "profileImage";

/// Text fields and the optional image of a user form submission.
#[derive(Debug, Default)]
pub struct UserForm {
    pub fields: Map<String, Value>,
    pub image: Option<UploadedFile>,
}

impl UserForm {
    /// Deserialize the text fields into a request DTO.
    pub fn parse_fields<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| HandlerError::bad_request(format!("Invalid form data: {}", e)))
    }
}

fn multipart_error(context: &str, e: MultipartError) -> HandlerError {
    error!("[read_user_form] {}: {}", context, e);
    let kind = if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        HandlerErrorKind::PayloadTooLarge
    } else {
        HandlerErrorKind::BadRequest
    };
    HandlerError::new(kind, format!("{}: {}", context, e.body_text()))
}

/// Read a user form: every text part becomes a field, `profileImage` is the
/// only file accepted and must be an image. Blank text values and empty file
/// parts are skipped. A text `profileImage` is kept as a field (the current
/// image URL sent back by edit forms).
pub async fn read_user_form(mut multipart: Multipart) -> Result<UserForm, HandlerError> {
    let mut form = UserForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to get next field", e))?
    {
        let name = field.name().map(|s| s.to_string()).unwrap_or_default();
        debug!("[read_user_form] Processing field: {}", name);

        if name == PROFILE_IMAGE_FIELD && field.file_name().is_some() {
            if form.image.is_some() {
                return Err(HandlerError::bad_request("Only one profile image may be uploaded"));
            }
            let filename = field.file_name().map(|s| s.to_string()).unwrap_or_default();
            let content_type = field.content_type().map(|s| s.to_string()).unwrap_or_default();
            let content = field
                .bytes()
                .await
                .map_err(|e| multipart_error("Failed to read profile image", e))?;
            if filename.is_empty() || content.is_empty() {
                // browsers send an empty part when no file was picked
                debug!("[read_user_form] Empty profile image part ignored");
                continue;
            }
            if !content_type.starts_with("image/") {
                return Err(HandlerError::bad_request(format!(
                    "Profile image must be an image, got '{}'",
                    content_type
                )));
            }
            info!("[read_user_form] Received file: {} ({} bytes)", filename, content.len());
            form.image = Some(UploadedFile { filename, content_type, content: content.to_vec() });
        } else if field.file_name().is_some() {
            return Err(HandlerError::bad_request(format!("Unexpected file field '{}'", name)));
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| multipart_error("Failed to read form field", e))?;
            let value = value.trim();
            if !value.is_empty() {
                form.fields.insert(name, Value::String(value.to_string()));
            }
        }
    }

    Ok(form)
}
