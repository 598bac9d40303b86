//! Record store client.
//!
//! This module defines the contract to the remote phone-lookup store
//! (`RecordStore`) and its HTTP implementation. The store owns all
//! persistence and search matching; the client only issues requests and
//! decodes responses.

pub mod error;
pub mod http;

use std::fmt;
use std::future::Future;

use serde::Serialize;

use crate::types::{AttributeEntry, BotUser, PhoneRecord, RecordStatus, Statistics, UserStatus};

pub use error::TransportError;
pub use http::HttpRecordStore;

/// Result of a single store call.
pub type StoreResult<T> = std::result::Result<T, TransportError>;

/// Optional free-text filter for list calls.
///
/// Blank input means "no filter": `SearchTerm::all()` and
/// `SearchTerm::new("")` are the same request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SearchTerm(Option<String>);

impl SearchTerm {
    pub fn new(text: impl AsRef<str>) -> Self {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            SearchTerm(None)
        } else {
            SearchTerm(Some(trimmed.to_string()))
        }
    }

    pub fn all() -> Self {
        SearchTerm(None)
    }

    /// Value for the `search` query parameter, if any.
    pub fn as_query(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_all(&self) -> bool {
        self.0.is_none()
    }
}

impl From<Option<String>> for SearchTerm {
    fn from(value: Option<String>) -> Self {
        value.map(SearchTerm::new).unwrap_or_default()
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(term) => write!(f, "\"{term}\""),
            None => write!(f, "(all)"),
        }
    }
}

/// Body of a create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRecord {
    pub phone: String,
    pub name: String,
    pub info: String,
    pub additional_info: Vec<AttributeEntry>,
}

/// Body of an update request; replaces every mutable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordUpdate {
    pub id: i64,
    pub phone: String,
    pub name: String,
    pub info: String,
    pub status: RecordStatus,
    pub additional_info: Vec<AttributeEntry>,
}

/// Body of a user status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserStatusChange {
    pub id: i64,
    pub status: UserStatus,
}

/// One operation per remote capability.
///
/// Every call is independent; no batching and no retries. `delete` is not
/// idempotent: deleting the same id twice fails the second time.
pub trait RecordStore: Send + Sync {
    fn statistics(&self) -> impl Future<Output = StoreResult<Statistics>> + Send;

    fn list(&self, search: &SearchTerm)
    -> impl Future<Output = StoreResult<Vec<PhoneRecord>>> + Send;

    fn create(&self, record: &NewRecord) -> impl Future<Output = StoreResult<PhoneRecord>> + Send;

    fn update(
        &self,
        update: &RecordUpdate,
    ) -> impl Future<Output = StoreResult<PhoneRecord>> + Send;

    fn delete(&self, id: i64) -> impl Future<Output = StoreResult<()>> + Send;

    fn list_users(
        &self,
        search: &SearchTerm,
    ) -> impl Future<Output = StoreResult<Vec<BotUser>>> + Send;

    fn set_user_status(
        &self,
        change: UserStatusChange,
    ) -> impl Future<Output = StoreResult<BotUser>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_search_means_all() {
        assert_eq!(SearchTerm::new(""), SearchTerm::all());
        assert_eq!(SearchTerm::new("   "), SearchTerm::all());
        assert_eq!(SearchTerm::from(None), SearchTerm::all());
        assert_eq!(SearchTerm::from(Some(String::new())), SearchTerm::all());
        assert!(SearchTerm::all().as_query().is_none());
    }

    #[test]
    fn test_search_term_trims() {
        let term = SearchTerm::new("  +7 999 ");
        assert_eq!(term.as_query(), Some("+7 999"));
        assert!(!term.is_all());
        assert_eq!(term.to_string(), "\"+7 999\"");
    }

    #[test]
    fn test_new_record_payload_shape() {
        let payload = NewRecord {
            phone: "+7 999 111".to_string(),
            name: "Test".to_string(),
            info: String::new(),
            additional_info: vec![AttributeEntry::new("VK", "vk.com/test")],
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "phone": "+7 999 111",
                "name": "Test",
                "info": "",
                "additional_info": [{"label": "VK", "value": "vk.com/test"}]
            })
        );
    }

    #[test]
    fn test_update_payload_carries_status() {
        let payload = RecordUpdate {
            id: 7,
            phone: "1".to_string(),
            name: "A".to_string(),
            info: "note".to_string(),
            status: RecordStatus::Inactive,
            additional_info: vec![],
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["status"], "inactive");
        assert_eq!(json["additional_info"], serde_json::json!([]));
    }
}
