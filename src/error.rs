use thiserror::Error;

use crate::remote::error::TransportError;

#[derive(Error, Debug)]
pub enum PhonedeskError {
    /// A required form field was empty; the store was never contacted.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("record #{0} not found")]
    RecordNotFound(i64),

    #[error("attribute row {index} out of range (form has {len} rows)")]
    AttributeIndex { index: usize, len: usize },

    #[error("the last attribute row cannot be removed")]
    LastAttribute,

    #[error("invalid attribute '{0}': expected LABEL=VALUE")]
    InvalidAttribute(String),

    #[error("invalid status '{0}'")]
    InvalidStatus(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl PhonedeskError {
    /// Whether this failure happened before any request left the client.
    pub fn is_validation(&self) -> bool {
        matches!(self, PhonedeskError::Validation(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, PhonedeskError::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, PhonedeskError>;
