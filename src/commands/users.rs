//! Bot user commands.
//!
//! - `users ls`: List or search bot users
//! - `users set-status`: Activate, block or deactivate a user

use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::{CommandOutput, open_session, or_dash, print_json};
use crate::cli::OutputOptions;
use crate::config::Config;
use crate::error::{PhonedeskError, Result};
use crate::remote::SearchTerm;
use crate::session::SubmitOutcome;
use crate::session::projection::{UserSort, filter_users_by_status, sort_users, user_counts};
use crate::types::{BotUser, UserStatus};

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Telegram ID")]
    telegram_id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Searches")]
    searches: u64,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Joined")]
    joined: String,
    #[tabled(rename = "Last active")]
    last_active: String,
}

impl From<&BotUser> for UserRow {
    fn from(user: &BotUser) -> Self {
        Self {
            id: user.id,
            telegram_id: user.telegram_id,
            name: user.display_name(),
            username: user
                .username
                .as_deref()
                .filter(|u| !u.trim().is_empty())
                .map(|u| format!("@{u}"))
                .unwrap_or_else(|| "-".to_string()),
            searches: user.search_count,
            status: user.status.to_string(),
            joined: or_dash(user.joined.as_deref()),
            last_active: or_dash(user.last_active.as_deref()),
        }
    }
}

/// Options for `users ls`
#[derive(Debug, Default)]
pub struct UserListOptions {
    pub search: Option<String>,
    pub status: Option<UserStatus>,
    pub sort: UserSort,
}

/// List bot users, optionally searching on the store
pub async fn cmd_users_ls(options: UserListOptions, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let session = open_session(&config)?;

    session
        .load_users(SearchTerm::from(options.search.clone()))
        .await?;
    let snapshot = session.users();

    let mut users = match options.status {
        Some(status) => filter_users_by_status(&snapshot.items, status),
        None => snapshot.items.to_vec(),
    };
    sort_users(&mut users, options.sort);

    if output.json {
        return print_json(&serde_json::to_value(&users)?);
    }

    if users.is_empty() {
        match snapshot.term.as_query() {
            Some(q) => println!("No users matching '{q}'."),
            None => println!("No users found."),
        }
        return Ok(());
    }

    let rows: Vec<UserRow> = users.iter().map(UserRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let counts = user_counts(&snapshot.items);
    println!(
        "\n{} user(s): {} active, {} blocked, {} inactive",
        counts.total,
        counts.active.to_string().green(),
        counts.blocked.to_string().red(),
        counts.inactive.to_string().dimmed()
    );
    Ok(())
}

/// Change a user's status
pub async fn cmd_users_set_status(
    id: i64,
    status: UserStatus,
    output: OutputOptions,
) -> Result<()> {
    let config = Config::load()?;
    let session = open_session(&config)?;

    let user = match session
        .coordinator()
        .submit_user_status(id, status)
        .await?
    {
        SubmitOutcome::Done(user) => user,
        SubmitOutcome::Busy => {
            return Err(PhonedeskError::Other(
                "another change is still being saved".to_string(),
            ));
        }
    };

    CommandOutput::new(serde_json::to_value(&user)?)
        .with_text(format!(
            "{} is now {}",
            user.display_name().cyan(),
            user.status
        ))
        .print(output)
}
