use crate::model::user::User;
use bson::{doc, Document};

/// Fields searched by a free-text directory query.
pub const SEARCHABLE_FIELDS: [&str; 4] = ["firstName", "lastName", "email", "location"];

/// Predicate applied to the user collection before sorting and pagination.
///
/// An empty search term matches every record. Otherwise a record matches when
/// the term is a case-insensitive substring of any of [`SEARCHABLE_FIELDS`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    search: Option<String>,
}

impl UserFilter {
    pub fn all() -> Self {
        UserFilter { search: None }
    }

    pub fn search(term: &str) -> Self {
        if term.is_empty() {
            return UserFilter::all();
        }
        UserFilter { search: Some(term.to_string()) }
    }

    pub fn term(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn matches(&self, user: &User) -> bool {
        let Some(term) = self.search.as_deref() else {
            return true;
        };
        let needle = term.to_lowercase();
        let contains = |value: &str| value.to_lowercase().contains(&needle);
        contains(&user.first_name)
            || contains(&user.last_name)
            || contains(&user.email)
            || user.location.as_deref().is_some_and(contains)
    }

    /// MongoDB query document. The term is regex-escaped so it matches literally.
    pub fn to_document(&self) -> Document {
        let Some(term) = self.search.as_deref() else {
            return Document::new();
        };
        let pattern = regex::escape(term);
        let clauses: Vec<Document> = SEARCHABLE_FIELDS
            .iter()
            .map(|field| {
                let mut clause = Document::new();
                clause.insert(*field, doc! { "$regex": pattern.as_str(), "$options": "i" });
                clause
            })
            .collect();
        doc! { "$or": clauses }
    }
}
