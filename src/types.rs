use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PhonedeskError;

/// Lifecycle state of a phone record.
///
/// Wire values are matched exactly; `FromStr` (used for command-line input)
/// is case-insensitive. Any other wire value decodes to `Unknown`, which is
/// shown but never counted or accepted as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Active,
    Inactive,
    #[serde(other)]
    Unknown,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "active",
            RecordStatus::Inactive => "inactive",
            RecordStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = PhonedeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(RecordStatus::Active),
            "inactive" => Ok(RecordStatus::Inactive),
            _ => Err(PhonedeskError::InvalidStatus(s.to_string())),
        }
    }
}

pub const VALID_RECORD_STATUSES: &[&str] = &["active", "inactive"];

/// Account state of a bot user. Unrecognized wire values decode to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Blocked,
    Inactive,
    #[serde(other)]
    Unknown,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Blocked => "blocked",
            UserStatus::Inactive => "inactive",
            UserStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = PhonedeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(UserStatus::Active),
            "blocked" => Ok(UserStatus::Blocked),
            "inactive" => Ok(UserStatus::Inactive),
            _ => Err(PhonedeskError::InvalidStatus(s.to_string())),
        }
    }
}

pub const VALID_USER_STATUSES: &[&str] = &["active", "blocked", "inactive"];

/// One label/value fact attached to a record (address, social handle, ...).
///
/// Labels are not unique; duplicates keep their order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeEntry {
    pub label: String,
    pub value: String,
}

impl AttributeEntry {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// An entry is submittable only when both halves are non-blank.
    pub fn is_complete(&self) -> bool {
        !self.label.trim().is_empty() && !self.value.trim().is_empty()
    }
}

impl FromStr for AttributeEntry {
    type Err = PhonedeskError;

    /// Parse `LABEL=VALUE`. The value may itself contain `=`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((label, value)) => Ok(AttributeEntry::new(label.trim(), value.trim())),
            None => Err(PhonedeskError::InvalidAttribute(s.to_string())),
        }
    }
}

/// A phone-lookup entry as held by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneRecord {
    pub id: i64,
    pub phone: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub info: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub additional_info: Vec<AttributeEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: RecordStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// A Telegram user of the lookup bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotUser {
    pub id: i64,
    pub telegram_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub search_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: UserStatus,
    #[serde(default)]
    pub joined: Option<String>,
    #[serde(default)]
    pub last_active: Option<String>,
}

impl BotUser {
    /// Human-readable name: full name, else `@username`, else the Telegram id.
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return full;
        }
        match self.username.as_deref().map(str::trim) {
            Some(username) if !username.is_empty() => format!("@{username}"),
            _ => self.telegram_id.to_string(),
        }
    }
}

/// Server-side aggregate snapshot. Read-only for this client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_users: u64,
    pub total_searches: u64,
    pub database_records: u64,
    pub active_today: u64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
