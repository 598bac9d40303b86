//! Top-level application configuration.
//!
//! Configuration is stored in `.phonedesk/config.yaml` (or under
//! `$PHONEDESK_ROOT`) and includes:
//! - The record store endpoint and HTTP timeouts
//! - The search debounce window
//! - The Telegram bot token registered for the lookup bot
//!
//! It is loaded once when a command starts and saved explicitly after a
//! change; components receive it as an argument rather than reading it
//! from a global.

use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PhonedeskError, Result};

/// Hosted admin endpoint of the phone-lookup service.
pub const DEFAULT_API_BASE_URL: &str =
    "https://functions.poehali.dev/9e153d8a-a027-436c-befe-cdaa25ef6f03";

pub const API_URL_ENV: &str = "PHONEDESK_API_URL";
pub const BOT_TOKEN_ENV: &str = "PHONEDESK_BOT_TOKEN";
pub const ROOT_ENV: &str = "PHONEDESK_ROOT";

/// Returns the directory holding phonedesk's local state.
pub fn phonedesk_root() -> PathBuf {
    if let Ok(root) = env::var(ROOT_ENV) {
        PathBuf::from(root)
    } else {
        PathBuf::from(".phonedesk")
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Record store endpoint settings
    #[serde(default, skip_serializing_if = "ApiConfig::is_default")]
    pub api: ApiConfig,

    /// Incremental search settings
    #[serde(default, skip_serializing_if = "SearchConfig::is_default")]
    pub search: SearchConfig,

    /// Telegram bot registration
    #[serde(default, skip_serializing_if = "TelegramConfig::is_empty")]
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Total request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds (default: 10)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Quiescence window before a typed search is sent (default: 500)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    500
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl SearchConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Telegram bot registration
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl TelegramConfig {
    pub fn is_empty(&self) -> bool {
        self.bot_token.is_none()
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        phonedesk_root().join("config.yaml")
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            PhonedeskError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PhonedeskError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create directory for config at {}: {}",
                        parent.display(),
                        e
                    ),
                ))
            })?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(&path, content).map_err(|e| {
            PhonedeskError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write config at {}: {}", path.display(), e),
            ))
        })?;

        // The file may hold the bot token: owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, permissions).map_err(|e| {
                PhonedeskError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to set permissions on config at {}: {}",
                        path.display(),
                        e
                    ),
                ))
            })?;
        }

        Ok(())
    }

    /// Record store base URL, from the environment or the config file
    pub fn api_base_url(&self) -> String {
        if let Ok(url) = env::var(API_URL_ENV)
            && !url.is_empty()
        {
            return url;
        }
        self.api.base_url.clone()
    }

    /// Telegram bot token, from the environment or the config file
    pub fn bot_token(&self) -> Option<String> {
        if let Ok(token) = env::var(BOT_TOKEN_ENV)
            && !token.is_empty()
        {
            return Some(token);
        }
        self.telegram.bot_token.clone()
    }

    pub fn set_bot_token(&mut self, token: String) {
        self.telegram.bot_token = Some(token);
    }

    pub fn clear_bot_token(&mut self) {
        self.telegram.bot_token = None;
    }

    pub fn set_api_base_url(&mut self, url: String) {
        self.api.base_url = url;
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.api.connect_timeout_secs)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.search.debounce_ms)
    }
}
