//! Configuration commands for managing phonedesk settings.
//!
//! - `config show`: Display current configuration
//! - `config get`: Print one value
//! - `config set`: Set a configuration value
//! - `config unset`: Restore a value to its default

use std::env;

use owo_colors::OwoColorize;
use serde_json::json;
use url::Url;

use super::CommandOutput;
use crate::cli::OutputOptions;
use crate::config::{API_URL_ENV, ApiConfig, BOT_TOKEN_ENV, Config, DEFAULT_API_BASE_URL};
use crate::error::{PhonedeskError, Result};

const VALID_KEYS: &[&str] = &[
    "api.base_url",
    "api.timeout_secs",
    "api.connect_timeout_secs",
    "search.debounce_ms",
    "telegram.bot_token",
];

/// Validate a config key, suggesting dot notation for underscore-only keys
fn validate_config_key(key: &str) -> Result<&str> {
    if VALID_KEYS.contains(&key) {
        return Ok(key);
    }

    // telegram_bot_token -> telegram.bot_token
    if !key.contains('.')
        && let Some(pos) = key.find('_')
    {
        let dot_version = format!("{}.{}", &key[..pos], &key[pos + 1..]);
        return Err(PhonedeskError::Config(format!(
            "invalid config key '{key}'. Use dot notation: '{dot_version}'"
        )));
    }

    Err(unknown_key(key))
}

fn unknown_key(key: &str) -> PhonedeskError {
    PhonedeskError::Config(format!(
        "unknown config key '{key}'. Valid keys: {}",
        VALID_KEYS.join(", ")
    ))
}

/// Mask a sensitive value by showing only the first 2 and last 2 characters
fn mask_sensitive_value(value: &str) -> String {
    let char_count = value.chars().count();
    if char_count > 4 {
        let first: String = value.chars().take(2).collect();
        let last: String = value.chars().skip(char_count - 2).collect();
        format!("{first}...{last}")
    } else {
        "****".to_string()
    }
}

fn env_is_set(name: &str) -> bool {
    env::var(name).is_ok_and(|v| !v.is_empty())
}

fn parse_seconds(key: &str, value: &str) -> Result<u64> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(PhonedeskError::Config(format!(
            "invalid value '{value}' for {key}. Expected a positive number of seconds"
        ))),
    }
}

fn validate_base_url(value: &str) -> Result<String> {
    let trimmed = value.trim();
    let url = Url::parse(trimmed).map_err(|e| {
        PhonedeskError::Config(format!("invalid value '{value}' for api.base_url: {e}"))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(PhonedeskError::Config(format!(
            "invalid value '{value}' for api.base_url. Expected an http or https URL"
        )));
    }
    Ok(trimmed.to_string())
}

/// Show current configuration
pub fn cmd_config_show(output: OutputOptions) -> Result<()> {
    let config = Config::load()?;

    let base_url = config.api_base_url();
    let url_from_env = env_is_set(API_URL_ENV);
    let token = config.bot_token();
    let token_from_env = env_is_set(BOT_TOKEN_ENV);
    let masked_token = token.as_deref().map(mask_sensitive_value);

    let json_output = json!({
        "api": {
            "base_url": base_url,
            "base_url_from_env": url_from_env,
            "timeout_secs": config.api.timeout_secs,
            "connect_timeout_secs": config.api.connect_timeout_secs,
        },
        "search": {
            "debounce_ms": config.search.debounce_ms,
        },
        "telegram": {
            "bot_token": masked_token,
            "bot_token_configured": token.is_some(),
            "bot_token_from_env": token_from_env,
        },
        "config_file": Config::config_path().to_string_lossy(),
    });

    let mut text_output = String::new();
    text_output.push_str(&format!("{}\n\n", "Configuration:".cyan().bold()));

    text_output.push_str(&format!("{}:\n", "api".cyan()));
    text_output.push_str(&format!("  base_url: {base_url}"));
    if url_from_env {
        text_output.push_str(&format!(" {}", format!("(from {API_URL_ENV})").dimmed()));
    }
    text_output.push('\n');
    text_output.push_str(&format!("  timeout_secs: {}\n", config.api.timeout_secs));
    text_output.push_str(&format!(
        "  connect_timeout_secs: {}\n",
        config.api.connect_timeout_secs
    ));

    text_output.push('\n');
    text_output.push_str(&format!("{}:\n", "search".cyan()));
    text_output.push_str(&format!("  debounce_ms: {}\n", config.search.debounce_ms));

    text_output.push('\n');
    text_output.push_str(&format!("{}:\n", "telegram".cyan()));
    let token_status = match &masked_token {
        Some(masked) if token_from_env => format!(
            "{} {}",
            masked.green(),
            format!("(from {BOT_TOKEN_ENV})").dimmed()
        ),
        Some(masked) => masked.green().to_string(),
        None => "not configured".dimmed().to_string(),
    };
    text_output.push_str(&format!("  bot_token: {token_status}\n"));

    text_output.push('\n');
    text_output.push_str(&format!(
        "{}",
        format!("Config file: {}", Config::config_path().display()).dimmed()
    ));

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)
}

/// Set a configuration value
pub fn cmd_config_set(key: &str, value: &str, output: OutputOptions) -> Result<()> {
    validate_config_key(key)?;

    let mut config = Config::load()?;

    let shown_value = match key {
        "api.base_url" => {
            let url = validate_base_url(value)?;
            config.set_api_base_url(url.clone());
            json!(url)
        }
        "api.timeout_secs" => {
            config.api.timeout_secs = parse_seconds(key, value)?;
            json!(config.api.timeout_secs)
        }
        "api.connect_timeout_secs" => {
            config.api.connect_timeout_secs = parse_seconds(key, value)?;
            json!(config.api.connect_timeout_secs)
        }
        "search.debounce_ms" => {
            config.search.debounce_ms = value.trim().parse::<u64>().map_err(|_| {
                PhonedeskError::Config(format!(
                    "invalid value '{value}' for search.debounce_ms. Expected milliseconds"
                ))
            })?;
            json!(config.search.debounce_ms)
        }
        "telegram.bot_token" => {
            let token = value.trim();
            if token.is_empty() {
                return Err(PhonedeskError::Config(
                    "telegram.bot_token cannot be empty; use `config unset` to remove it"
                        .to_string(),
                ));
            }
            config.set_bot_token(token.to_string());
            json!(mask_sensitive_value(token))
        }
        _ => return Err(unknown_key(key)),
    };

    config.save()?;
    tracing::info!("config key {key} updated");

    let text = format!("Set {} to {}", key.cyan(), display_value(&shown_value));
    CommandOutput::new(json!({
        "action": "config_set",
        "key": key,
        "value": shown_value,
        "success": true,
    }))
    .with_text(text)
    .print(output)
}

/// Restore a configuration value to its default
pub fn cmd_config_unset(key: &str, output: OutputOptions) -> Result<()> {
    validate_config_key(key)?;

    let mut config = Config::load()?;
    match key {
        "api.base_url" => config.set_api_base_url(DEFAULT_API_BASE_URL.to_string()),
        "api.timeout_secs" => config.api.timeout_secs = ApiConfig::default().timeout_secs,
        "api.connect_timeout_secs" => {
            config.api.connect_timeout_secs = ApiConfig::default().connect_timeout_secs
        }
        "search.debounce_ms" => config.search = Default::default(),
        "telegram.bot_token" => config.clear_bot_token(),
        _ => return Err(unknown_key(key)),
    }
    config.save()?;

    CommandOutput::new(json!({
        "action": "config_unset",
        "key": key,
        "success": true,
    }))
    .with_text(format!("Unset {}", key.cyan()))
    .print(output)
}

/// Get a specific configuration value
pub fn cmd_config_get(key: &str, output: OutputOptions) -> Result<()> {
    validate_config_key(key)?;

    let config = Config::load()?;

    let (json_output, text_output) = match key {
        "api.base_url" => {
            let url = config.api_base_url();
            (json!({ "key": key, "value": url }), url)
        }
        "api.timeout_secs" => (
            json!({ "key": key, "value": config.api.timeout_secs }),
            config.api.timeout_secs.to_string(),
        ),
        "api.connect_timeout_secs" => (
            json!({ "key": key, "value": config.api.connect_timeout_secs }),
            config.api.connect_timeout_secs.to_string(),
        ),
        "search.debounce_ms" => (
            json!({ "key": key, "value": config.search.debounce_ms }),
            config.search.debounce_ms.to_string(),
        ),
        "telegram.bot_token" => {
            let Some(token) = config.bot_token() else {
                return Err(PhonedeskError::Config(
                    "telegram.bot_token not set".to_string(),
                ));
            };
            let masked = mask_sensitive_value(&token);
            let json = json!({
                "key": key,
                "value": masked,
                "configured": true,
                "masked": true,
            });
            let text = format!("{masked} (masked - showing first 2 and last 2 characters)");
            (json, text)
        }
        _ => return Err(unknown_key(key)),
    };

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
