//! Transport failures reported by the record store client.
//!
//! The store signals failure only through the HTTP status; response bodies
//! are never parsed for error codes.

use std::fmt;

use reqwest::StatusCode;

/// A failed call to the record store: non-2xx status or network failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    /// Which capability failed (e.g. "delete phone record")
    pub operation: &'static str,
    /// HTTP status code, absent for network-level failures
    pub status: Option<StatusCode>,
    /// Human-readable detail
    pub message: String,
}

impl TransportError {
    pub fn network(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(operation: &'static str, status: StatusCode) -> Self {
        Self {
            operation,
            status: Some(status),
            message: format!("HTTP {status}"),
        }
    }

    /// The store answered 2xx with an empty (`null`) entity, which it does
    /// when the target id no longer exists.
    pub fn missing_entity(operation: &'static str) -> Self {
        Self {
            operation,
            status: Some(StatusCode::NOT_FOUND),
            message: "no such entity".to_string(),
        }
    }

    /// Whether the target id no longer exists on the store.
    pub fn is_not_found(&self) -> bool {
        self.status == Some(StatusCode::NOT_FOUND)
    }

    pub fn is_server_error(&self) -> bool {
        self.status.is_some_and(|s| s.is_server_error())
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to {}: {}", self.operation, self.message)
    }
}

impl std::error::Error for TransportError {}

impl TransportError {
    pub(crate) fn from_reqwest(operation: &'static str, err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self {
                operation,
                status: Some(status),
                message: err.to_string(),
            },
            None => Self::network(operation, err.to_string()),
        }
    }
}
