//! Phone record commands.
//!
//! - `records ls`: List or search records
//! - `records add`: Create a record
//! - `records edit`: Replace a record's fields
//! - `records rm`: Delete a record
//! - `records browse`: Interactive incremental search on stdin

use owo_colors::OwoColorize;
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{CommandOutput, open_session, or_dash, print_json};
use crate::cli::OutputOptions;
use crate::config::Config;
use crate::error::{PhonedeskError, Result};
use crate::remote::{HttpRecordStore, SearchTerm};
use crate::session::projection::{
    RecordSort, filter_records_by_status, record_counts, sort_records,
};
use crate::session::{
    DeleteTarget, Notice, NoticeLevel, Notifier, RecordForm, Session, SubmitOutcome,
};
use crate::types::{AttributeEntry, PhoneRecord, RecordStatus};

/// A row in the record table
#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Info")]
    info: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&PhoneRecord> for RecordRow {
    fn from(record: &PhoneRecord) -> Self {
        Self {
            id: record.id,
            phone: record.phone.clone(),
            name: record.name.clone(),
            status: record.status.to_string(),
            info: format_info(record),
            created: or_dash(record.created_at.as_deref()),
        }
    }
}

/// Legacy info text followed by each attribute on its own line
fn format_info(record: &PhoneRecord) -> String {
    let mut lines: Vec<String> = Vec::new();
    if !record.info.trim().is_empty() {
        lines.push(record.info.trim().to_string());
    }
    lines.extend(
        record
            .additional_info
            .iter()
            .map(|entry| format!("{}: {}", entry.label, entry.value)),
    );
    if lines.is_empty() {
        "-".to_string()
    } else {
        lines.join("\n")
    }
}

/// Options for `records ls`
#[derive(Debug, Default)]
pub struct ListOptions {
    pub search: Option<String>,
    pub status: Option<RecordStatus>,
    pub sort: RecordSort,
}

/// Options for `records add`
#[derive(Debug, Default)]
pub struct AddOptions {
    pub phone: String,
    pub name: String,
    pub info: Option<String>,
    pub attributes: Vec<AttributeEntry>,
}

/// Options for `records edit`; unset fields keep their current value
#[derive(Debug, Default)]
pub struct EditOptions {
    pub phone: Option<String>,
    pub name: Option<String>,
    pub info: Option<String>,
    pub status: Option<RecordStatus>,
    pub attributes: Vec<AttributeEntry>,
    pub clear_attributes: bool,
}

fn record_view(records: &[PhoneRecord], options: &ListOptions) -> Vec<PhoneRecord> {
    let mut records = match options.status {
        Some(status) => filter_records_by_status(records, status),
        None => records.to_vec(),
    };
    sort_records(&mut records, options.sort);
    records
}

fn render_records(records: &[PhoneRecord], all: &[PhoneRecord], term: &SearchTerm) -> String {
    if records.is_empty() {
        return match term.as_query() {
            Some(q) => format!("No records matching '{q}'."),
            None => "No records found.".to_string(),
        };
    }

    let rows: Vec<RecordRow> = records.iter().map(RecordRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());

    let counts = record_counts(all);
    format!(
        "{table}\n\n{} record(s): {} active, {} inactive",
        counts.total,
        counts.active.to_string().green(),
        counts.inactive.to_string().dimmed()
    )
}

fn record_text(action: &str, record: &PhoneRecord) -> String {
    format!(
        "{} #{} {} ({})",
        action,
        record.id.to_string().cyan(),
        record.name,
        record.phone
    )
}

fn busy() -> PhonedeskError {
    PhonedeskError::Other("another change is still being saved".to_string())
}

/// List records, optionally searching on the store
pub async fn cmd_records_ls(options: ListOptions, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let session = open_session(&config)?;

    let term = SearchTerm::from(options.search.clone());
    session.load_records(term).await?;
    let snapshot = session.records();
    let records = record_view(&snapshot.items, &options);

    if output.json {
        return print_json(&serde_json::to_value(&records)?);
    }
    println!("{}", render_records(&records, &snapshot.items, &snapshot.term));
    Ok(())
}

/// Create a record
pub async fn cmd_records_add(options: AddOptions, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let session = open_session(&config)?;

    let mut form = RecordForm::create();
    form.phone = options.phone;
    form.name = options.name;
    form.info = options.info.unwrap_or_default();
    for entry in options.attributes {
        form.attributes.push(entry);
    }

    let created = match session.coordinator().submit_create(&form).await? {
        SubmitOutcome::Done(record) => record,
        SubmitOutcome::Busy => return Err(busy()),
    };

    CommandOutput::new(serde_json::to_value(&created)?)
        .with_text(record_text("Added", &created))
        .print(output)
}

/// Replace a record's fields, keeping the ones not given
pub async fn cmd_records_edit(id: i64, options: EditOptions, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let session = open_session(&config)?;

    session.load_records(SearchTerm::all()).await?;
    let snapshot = session.records();
    let record = snapshot
        .iter()
        .find(|r| r.id == id)
        .ok_or(PhonedeskError::RecordNotFound(id))?;

    let mut form = RecordForm::edit(record);
    if let Some(phone) = options.phone {
        form.phone = phone;
    }
    if let Some(name) = options.name {
        form.name = name;
    }
    if let Some(info) = options.info {
        form.info = info;
    }
    if let Some(status) = options.status {
        form.status = status;
    }
    if options.clear_attributes {
        form.attributes.clear();
    }
    for entry in options.attributes {
        form.attributes.push(entry);
    }

    let updated = match session.coordinator().submit_update(&form).await? {
        SubmitOutcome::Done(record) => record,
        SubmitOutcome::Busy => return Err(busy()),
    };

    CommandOutput::new(serde_json::to_value(&updated)?)
        .with_text(record_text("Updated", &updated))
        .print(output)
}

/// Delete a record
pub async fn cmd_records_rm(id: i64, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let session = open_session(&config)?;

    let target = DeleteTarget::new(id, format!("record #{id}"));
    if session.coordinator().submit_delete(target).await?.is_busy() {
        return Err(busy());
    }

    CommandOutput::new(json!({
        "action": "record_deleted",
        "id": id,
        "success": true,
    }))
    .with_text(format!("Deleted record #{}", id.to_string().cyan()))
    .print(output)
}

/// Interactive search: every stdin line replaces the search text.
///
/// The table is reprinted whenever the record list changes. At end of
/// input the last typed search is loaded immediately instead of waiting
/// for the debounce window.
pub async fn cmd_records_browse(options: ListOptions) -> Result<()> {
    let config = Config::load()?;
    let store = HttpRecordStore::from_config(&config)?;
    let (notifier, mut notices) = Notifier::channel();
    let session = Session::new(
        std::sync::Arc::new(store),
        config.debounce_window(),
        notifier,
    );

    let mut records = session.watch_records();
    session.start().await?;

    eprintln!(
        "{}",
        "Type a search and press Enter; an empty line shows everything. Ctrl-D to quit."
            .dimmed()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(text) => session.search_records(text),
                None => break,
            },
            changed = records.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = records.borrow_and_update().clone();
                let view = record_view(&snapshot.items, &options);
                println!("{}", render_records(&view, &snapshot.items, &snapshot.term));
            }
            Some(notice) = notices.recv() => print_notice(&notice),
        }
    }

    session.shutdown();
    let term = session.record_search_term();
    if session.records().term != term {
        session.load_records(term).await?;
        let snapshot = session.records();
        let view = record_view(&snapshot.items, &options);
        println!("{}", render_records(&view, &snapshot.items, &snapshot.term));
    }
    Ok(())
}

fn print_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Info => eprintln!("{}", notice.message.dimmed()),
        NoticeLevel::Warning => eprintln!("{}", notice.message.yellow()),
        NoticeLevel::Error => eprintln!("{}", notice.message.red()),
    }
}
