mod config;
mod records;
mod stats;
mod users;

pub use config::{cmd_config_get, cmd_config_set, cmd_config_show, cmd_config_unset};
pub use records::{
    AddOptions, EditOptions, ListOptions, cmd_records_add, cmd_records_browse, cmd_records_edit,
    cmd_records_ls, cmd_records_rm,
};
pub use stats::cmd_stats;
pub use users::{UserListOptions, cmd_users_ls, cmd_users_set_status};

use std::sync::Arc;

use serde_json::Value;

use crate::cli::OutputOptions;
use crate::config::Config;
use crate::error::Result;
use crate::remote::HttpRecordStore;
use crate::session::{Notifier, Session};

/// Output produced by a command: always a JSON value, optionally a
/// human-readable rendering used when `--json` is not set.
pub struct CommandOutput {
    json: Value,
    text: Option<String>,
}

impl CommandOutput {
    pub fn new(json: Value) -> Self {
        Self { json, text: None }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn print(self, output: OutputOptions) -> Result<()> {
        match self.text {
            Some(text) if !output.json => {
                println!("{text}");
                Ok(())
            }
            _ => print_json(&self.json),
        }
    }
}

/// Pretty-print a JSON value to stdout
pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Build a session against the configured record store.
///
/// Commands run one request at a time and report failures through their
/// return value, so notices are only logged.
fn open_session(config: &Config) -> Result<Session<HttpRecordStore>> {
    let store = HttpRecordStore::from_config(config)?;
    tracing::debug!("using record store at {}", store.base_url());
    Ok(Session::new(
        Arc::new(store),
        config.debounce_window(),
        Notifier::silent(),
    ))
}

fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}
