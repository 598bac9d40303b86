use owo_colors::OwoColorize;

use super::{CommandOutput, open_session};
use crate::cli::OutputOptions;
use crate::config::Config;
use crate::error::Result;

/// Show the store's aggregate counters
pub async fn cmd_stats(output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let session = open_session(&config)?;
    let stats = session.statistics().await?;

    let text = format!(
        "{}\n\n  Users:          {}\n  Searches:       {}\n  Records:        {}\n  Active today:   {}",
        "Statistics:".cyan().bold(),
        stats.total_users,
        stats.total_searches,
        stats.database_records,
        stats.active_today
    );

    CommandOutput::new(serde_json::to_value(stats)?)
        .with_text(text)
        .print(output)
}
