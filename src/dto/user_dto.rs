use crate::model::user::{Gender, User, UserStatus, UserUpdate};
use crate::service::user_directory::UserPage;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;

fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(String::deserialize(deserializer)?.trim().to_string())
}

/// Trimmed value; blank counts as absent, same as a blank form field.
fn trimmed_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(email)]
    pub email: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 32))]
    pub mobile: String,
    pub gender: Gender,
    #[serde(default)]
    pub user_status: UserStatus,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 200))]
    pub location: Option<String>,
}

impl CreateUserRequest {
    /// Build the record to insert. Id and timestamps are assigned by the repository.
    pub fn into_user(self, profile_image: Option<String>) -> User {
        let now = Utc::now();
        User {
            id: None,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            mobile: self.mobile,
            gender: self.gender,
            user_status: self.user_status,
            profile_image,
            location: self.location,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Any subset of the user's editable fields.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 32))]
    pub mobile: Option<String>,
    pub gender: Option<Gender>,
    pub user_status: Option<UserStatus>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 200))]
    pub location: Option<String>,
    /// URL of the image to keep, sent back by edit forms in place of a file
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(url)]
    pub profile_image: Option<String>,
}

impl UpdateUserRequest {
    /// A freshly uploaded image wins over a kept URL.
    pub fn into_update(self, uploaded_image: Option<String>) -> UserUpdate {
        UserUpdate {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            mobile: self.mobile,
            gender: self.gender,
            user_status: self.user_status,
            profile_image: uploaded_image.or(self.profile_image),
            location: self.location,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub user_status: UserStatus,
}

/// Raw listing query string. Values are parsed by hand so bad input yields a JSON 400.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUsersQuery {
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListUsersQuery {
    /// `(search, page, limit)` with defaults applied.
    pub fn parse(self) -> Result<(String, u64, u64), String> {
        fn number(raw: Option<String>, name: &str, default: u64) -> Result<u64, String> {
            match raw.as_deref().map(str::trim) {
                None | Some("") => Ok(default),
                Some(v) => v
                    .parse::<u64>()
                    .map_err(|_| format!("{} must be a positive integer, got '{}'", name, v)),
            }
        }
        let page = number(self.page, "page", DEFAULT_PAGE)?;
        let limit = number(self.limit, "limit", DEFAULT_PAGE_SIZE)?;
        Ok((self.search.unwrap_or_default(), page, limit))
    }
}

fn rfc3339(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// User JSON as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub gender: Gender,
    pub user_status: UserStatus,
    pub profile_image: String,
    pub location: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl UserResponse {
    pub fn from_user(user: User, default_profile_image: &str) -> Self {
        UserResponse {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            created_at: rfc3339(&user.created_at),
            updated_at: rfc3339(&user.updated_at),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            mobile: user.mobile,
            gender: user.gender,
            user_status: user.user_status,
            profile_image: user.profile_image.unwrap_or_else(|| default_profile_image.to_string()),
            location: user.location,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl UserListResponse {
    pub fn from_page(page: UserPage, default_profile_image: &str) -> Self {
        let total_pages = page.total_pages();
        UserListResponse {
            users: page
                .records
                .into_iter()
                .map(|u| UserResponse::from_user(u, default_profile_image))
                .collect(),
            total: page.total_count,
            page: page.page,
            limit: page.page_size,
            total_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
