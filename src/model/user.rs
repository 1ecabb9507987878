use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "Active",
            UserStatus::Inactive => "Inactive",
        }
    }
}

/// A user record as stored in the `users` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub gender: Gender,
    #[serde(default)]
    pub user_status: UserStatus,
    pub profile_image: Option<String>,
    pub location: Option<String>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Partial replacement of a user's fields. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub gender: Option<Gender>,
    pub user_status: Option<UserStatus>,
    pub profile_image: Option<String>,
    pub location: Option<String>,
}

impl UserUpdate {
    /// Apply the set fields onto `user` and bump `updated_at`.
    pub fn apply_to(&self, user: &mut User, now: DateTime<Utc>) {
        if let Some(ref v) = self.first_name {
            user.first_name = v.clone();
        }
        if let Some(ref v) = self.last_name {
            user.last_name = v.clone();
        }
        if let Some(ref v) = self.email {
            user.email = v.clone();
        }
        if let Some(ref v) = self.mobile {
            user.mobile = v.clone();
        }
        if let Some(v) = self.gender {
            user.gender = v;
        }
        if let Some(v) = self.user_status {
            user.user_status = v;
        }
        if let Some(ref v) = self.profile_image {
            user.profile_image = Some(v.clone());
        }
        if let Some(ref v) = self.location {
            user.location = Some(v.clone());
        }
        user.updated_at = now;
    }
}
