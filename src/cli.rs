use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io;

use crate::session::projection::{RecordSort, UserSort};
use crate::types::{
    AttributeEntry, RecordStatus, UserStatus, VALID_RECORD_STATUSES, VALID_USER_STATUSES,
};

#[derive(Parser)]
#[command(name = "phonedesk")]
#[command(about = "Admin client for a phone-lookup record store")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Output flags shared by commands
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show aggregate statistics from the store
    Stats {
        #[command(flatten)]
        output: OutputOptions,
    },

    /// Manage phone records
    #[command(visible_alias = "r")]
    Records {
        #[command(subcommand)]
        action: RecordsAction,
    },

    /// Manage bot users
    #[command(visible_alias = "u")]
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for [possible values: bash, zsh, fish, powershell, elvish]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum RecordsAction {
    /// List records, optionally filtered by a store-side search
    Ls {
        /// Search text (phone or name, matched by the store)
        #[arg(short, long)]
        search: Option<String>,

        /// Only show records with this status (active, inactive)
        #[arg(long, value_parser = parse_record_status)]
        status: Option<RecordStatus>,

        /// Sort by: id (newest first), name, phone
        #[arg(long, default_value = "id", value_parser = parse_record_sort)]
        sort: RecordSort,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Add a new record
    Add {
        /// Phone number
        #[arg(long)]
        phone: String,

        /// Owner name
        #[arg(long)]
        name: String,

        /// Free-text note
        #[arg(long)]
        info: Option<String>,

        /// Extra attribute as LABEL=VALUE (repeatable, order is kept)
        #[arg(
            short = 'a',
            long = "attr",
            value_parser = parse_attribute,
            action = clap::ArgAction::Append
        )]
        attributes: Vec<AttributeEntry>,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Edit an existing record (unspecified fields are kept)
    Edit {
        /// Record ID
        id: i64,

        /// New phone number
        #[arg(long)]
        phone: Option<String>,

        /// New owner name
        #[arg(long)]
        name: Option<String>,

        /// New free-text note
        #[arg(long)]
        info: Option<String>,

        /// New status (active, inactive)
        #[arg(long, value_parser = parse_record_status)]
        status: Option<RecordStatus>,

        /// Attribute to append as LABEL=VALUE (repeatable)
        #[arg(
            short = 'a',
            long = "attr",
            value_parser = parse_attribute,
            action = clap::ArgAction::Append
        )]
        attributes: Vec<AttributeEntry>,

        /// Drop existing attributes before appending new ones
        #[arg(long)]
        clear_attrs: bool,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Delete a record
    Rm {
        /// Record ID
        id: i64,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Interactive search: each line read from stdin becomes the search text
    Browse {
        /// Only show records with this status (active, inactive)
        #[arg(long, value_parser = parse_record_status)]
        status: Option<RecordStatus>,

        /// Sort by: id (newest first), name, phone
        #[arg(long, default_value = "id", value_parser = parse_record_sort)]
        sort: RecordSort,
    },
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// List bot users, optionally filtered by a store-side search
    Ls {
        /// Search text (name, username or Telegram ID)
        #[arg(short, long)]
        search: Option<String>,

        /// Only show users with this status (active, blocked, inactive)
        #[arg(long, value_parser = parse_user_status)]
        status: Option<UserStatus>,

        /// Sort by: searches (most first), name, id
        #[arg(long, default_value = "searches", value_parser = parse_user_sort)]
        sort: UserSort,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Change a user's status
    SetStatus {
        /// User ID
        id: i64,

        /// New status (active, blocked, inactive)
        #[arg(value_parser = parse_user_status)]
        status: UserStatus,

        #[command(flatten)]
        output: OutputOptions,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        #[command(flatten)]
        output: OutputOptions,
    },
    /// Get a configuration value
    Get {
        /// Configuration key (api.base_url, api.timeout_secs, api.connect_timeout_secs, search.debounce_ms, telegram.bot_token)
        key: String,

        #[command(flatten)]
        output: OutputOptions,
    },
    /// Set a configuration value
    Set {
        /// Configuration key (api.base_url, api.timeout_secs, api.connect_timeout_secs, search.debounce_ms, telegram.bot_token)
        key: String,
        /// Value to set
        value: String,

        #[command(flatten)]
        output: OutputOptions,
    },
    /// Restore a configuration value to its default
    Unset {
        /// Configuration key
        key: String,

        #[command(flatten)]
        output: OutputOptions,
    },
}

impl Commands {
    /// Execute the command, dispatching to the appropriate handler.
    pub async fn run(self) -> crate::error::Result<()> {
        use crate::commands::{
            AddOptions, EditOptions, ListOptions, UserListOptions, cmd_config_get,
            cmd_config_set, cmd_config_show, cmd_config_unset, cmd_records_add,
            cmd_records_browse, cmd_records_edit, cmd_records_ls, cmd_records_rm, cmd_stats,
            cmd_users_ls, cmd_users_set_status,
        };

        match self {
            Commands::Stats { output } => cmd_stats(output).await,

            Commands::Records { action } => match action {
                RecordsAction::Ls {
                    search,
                    status,
                    sort,
                    output,
                } => {
                    cmd_records_ls(
                        ListOptions {
                            search,
                            status,
                            sort,
                        },
                        output,
                    )
                    .await
                }
                RecordsAction::Add {
                    phone,
                    name,
                    info,
                    attributes,
                    output,
                } => {
                    cmd_records_add(
                        AddOptions {
                            phone,
                            name,
                            info,
                            attributes,
                        },
                        output,
                    )
                    .await
                }
                RecordsAction::Edit {
                    id,
                    phone,
                    name,
                    info,
                    status,
                    attributes,
                    clear_attrs,
                    output,
                } => {
                    cmd_records_edit(
                        id,
                        EditOptions {
                            phone,
                            name,
                            info,
                            status,
                            attributes,
                            clear_attributes: clear_attrs,
                        },
                        output,
                    )
                    .await
                }
                RecordsAction::Rm { id, output } => cmd_records_rm(id, output).await,
                RecordsAction::Browse { status, sort } => {
                    cmd_records_browse(ListOptions {
                        search: None,
                        status,
                        sort,
                    })
                    .await
                }
            },

            Commands::Users { action } => match action {
                UsersAction::Ls {
                    search,
                    status,
                    sort,
                    output,
                } => {
                    cmd_users_ls(
                        UserListOptions {
                            search,
                            status,
                            sort,
                        },
                        output,
                    )
                    .await
                }
                UsersAction::SetStatus { id, status, output } => {
                    cmd_users_set_status(id, status, output).await
                }
            },

            Commands::Config { action } => match action {
                ConfigAction::Show { output } => cmd_config_show(output),
                ConfigAction::Get { key, output } => cmd_config_get(&key, output),
                ConfigAction::Set { key, value, output } => cmd_config_set(&key, &value, output),
                ConfigAction::Unset { key, output } => cmd_config_unset(&key, output),
            },

            Commands::Completions { shell } => {
                generate_completions(shell);
                Ok(())
            }
        }
    }
}

fn parse_with_validation<T, F>(
    s: &str,
    parser: F,
    field_name: &str,
    valid_values: &[&str],
) -> Result<T, String>
where
    F: FnOnce(&str) -> Result<T, String>,
{
    parser(s).map_err(|_| {
        format!(
            "Invalid {}. Must be one of: {}",
            field_name,
            valid_values.join(", ")
        )
    })
}

fn parse_record_status(s: &str) -> Result<RecordStatus, String> {
    parse_with_validation(
        s,
        |v| v.parse().map_err(|_| String::new()),
        "status",
        VALID_RECORD_STATUSES,
    )
}

fn parse_user_status(s: &str) -> Result<UserStatus, String> {
    parse_with_validation(
        s,
        |v| v.parse().map_err(|_| String::new()),
        "status",
        VALID_USER_STATUSES,
    )
}

fn parse_record_sort(s: &str) -> Result<RecordSort, String> {
    parse_with_validation(
        s,
        |v| v.parse().map_err(|_| String::new()),
        "sort key",
        &["id", "name", "phone"],
    )
}

fn parse_user_sort(s: &str) -> Result<UserSort, String> {
    parse_with_validation(
        s,
        |v| v.parse().map_err(|_| String::new()),
        "sort key",
        &["searches", "name", "id"],
    )
}

fn parse_attribute(s: &str) -> Result<AttributeEntry, String> {
    s.parse::<AttributeEntry>().map_err(|e| e.to_string())
}

/// Generate shell completions
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "phonedesk", &mut io::stdout());
}
