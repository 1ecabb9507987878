use crate::model::user::User;
use chrono::SecondsFormat;

pub const CSV_HEADER: [&str; 9] = [
    "ID",
    "First Name",
    "Last Name",
    "Email",
    "Mobile",
    "Gender",
    "Status",
    "Location",
    "Created At",
];

#[derive(Debug, thiserror::Error)]
pub enum CsvExportError {
    #[error("CSV write error: {0}")]
    Write(#[from] csv::Error),

    #[error("CSV flush error: {0}")]
    Flush(String),
}

/// Encode users as CSV, header first, one row per user in the order given.
pub fn users_to_csv(users: &[User]) -> Result<Vec<u8>, CsvExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for user in users {
        let id = user.id.map(|id| id.to_hex()).unwrap_or_default();
        let created_at = user.created_at.to_rfc3339_opts(SecondsFormat::Millis, true);
        writer.write_record([
            id.as_str(),
            user.first_name.as_str(),
            user.last_name.as_str(),
            user.email.as_str(),
            user.mobile.as_str(),
            user.gender.as_str(),
            user.user_status.as_str(),
            user.location.as_deref().unwrap_or(""),
            created_at.as_str(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| CsvExportError::Flush(e.to_string()))
}
