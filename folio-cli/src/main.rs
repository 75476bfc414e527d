//! folio - browse and edit a JSON record file as a paginated table.
//!
//! Usage:
//!   folio -d trades.json list                          # first page
//!   folio -d trades.json list --search acme --sort qty --desc
//!   folio -d trades.json list --filter side=buy --page 2
//!   folio -d trades.json create ticker=ACME qty=10
//!   folio -d trades.json update 3 qty=12
//!   folio -d trades.json delete 3 4 --yes

mod error;
mod render;

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};
use folio_table::column::{Column, InputKind};
use folio_table::config::TableConfig;
use folio_table::memory::{JsonRecord, MemorySource};
use folio_table::source::Confirm;
use folio_table::{FormData, Outcome, RowId, TableController};
use serde_json::Value;
use simplelog::{Config, LevelFilter, WriteLogger};

use crate::error::{CliError, Result};

/// Primary key used when the configuration names none.
const DEFAULT_PRIMARY_KEY: &str = "id";

#[derive(Parser)]
#[command(name = "folio", about = "Paginated table over a JSON record file")]
struct Args {
    /// JSON file holding an array of records.
    #[arg(short, long, value_name = "PATH")]
    data: PathBuf,

    /// Table configuration (JSON).
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log file.
    #[arg(long, default_value = "folio.log")]
    log_file: PathBuf,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Answer yes to every confirmation prompt.
    #[arg(short, long)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print one page of records.
    List {
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        #[arg(long)]
        per_page: Option<usize>,

        /// Free-text search over every field.
        #[arg(short, long)]
        search: Option<String>,

        /// Column filter, FIELD=VALUE. Repeatable.
        #[arg(short, long = "filter", value_name = "FIELD=VALUE")]
        filters: Vec<String>,

        /// Column to sort by.
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending.
        #[arg(long, requires = "sort")]
        desc: bool,
    },
    /// Create a record from FIELD=VALUE assignments.
    Create {
        #[arg(value_name = "FIELD=VALUE", required = true)]
        fields: Vec<String>,
    },
    /// Update the record with the given primary key.
    Update {
        key: String,

        #[arg(value_name = "FIELD=VALUE", required = true)]
        fields: Vec<String>,
    },
    /// Delete records by primary key.
    Delete {
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Asks on the terminal before deletes.
struct PromptConfirm {
    assume_yes: bool,
}

#[async_trait]
impl Confirm for PromptConfirm {
    async fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        let message = message.to_string();
        tokio::task::spawn_blocking(move || {
            print!("{message} [y/N] ");
            let _ = io::stdout().flush();
            let mut answer = String::new();
            io::stdin().read_line(&mut answer).is_ok()
                && matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
        })
        .await
        .unwrap_or(false)
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let log_file = File::create(&args.log_file).map_err(|source| CliError::Write {
        path: args.log_file.clone(),
        source,
    })?;
    WriteLogger::init(args.log_level.into(), Config::default(), log_file)?;

    let records = load_records(&args.data)?;
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => TableConfig::default(),
    };
    let primary_key = config
        .primary_key
        .get_or_insert_with(|| DEFAULT_PRIMARY_KEY.to_string())
        .clone();
    log::info!("loaded {} records from {}", records.len(), args.data.display());

    let columns = columns_of(&records, &primary_key);
    let store = Arc::new(MemorySource::new(records, primary_key.clone()));
    let table = TableController::builder()
        .fetch_shared(store.clone())
        .crud_shared(store.clone())
        .confirm(PromptConfirm {
            assume_yes: args.yes,
        })
        .columns(columns)
        .config(config)
        .build()?;
    settle(&table, table.mount().await)?;

    match args.command {
        Command::List {
            page,
            per_page,
            search,
            filters,
            sort,
            desc,
        } => {
            if let Some(per_page) = per_page
                && table.set_per_page(per_page).await == Outcome::Ignored
                && table.filters().per_page != per_page
            {
                let allowed = &table.config().per_page_options;
                return Err(CliError::Rejected(format!(
                    "page size {per_page} not allowed, use one of {allowed:?}"
                )));
            }
            if let Some(search) = search {
                table.set_search_draft(search);
                settle(&table, table.search().await)?;
            }
            if !filters.is_empty() {
                for (field, value) in parse_assignments(&filters)? {
                    if !table.set_column_filter(&field, value) {
                        return Err(CliError::UnknownColumn(field));
                    }
                }
                settle(&table, table.apply_filters().await)?;
            }
            if let Some(column) = sort {
                let presses = if desc { 2 } else { 1 };
                for _ in 0..presses {
                    match table.toggle_sort(&column).await {
                        Outcome::Ignored => return Err(CliError::UnknownColumn(column)),
                        outcome => settle(&table, outcome)?,
                    }
                }
            }
            if page != 1 && table.set_page(page).await == Outcome::Ignored {
                return Err(CliError::Rejected(format!(
                    "page {page} out of range (1..={})",
                    table.pagination().pages_num
                )));
            }
            println!("{}", render::table(&table));
            return Ok(());
        }
        Command::Create { fields } => {
            let payload: FormData = parse_assignments(&fields)?.into_iter().collect();
            table.open_create();
            settle(&table, table.submit(payload).await)?;
            if let Some(row) = table.rows().first() {
                println!("{}", render::record(row.data()));
            }
        }
        Command::Update { key, fields } => {
            let id = locate(&table, &primary_key, &key).await?;
            if !table.open_update(&id) {
                return Err(CliError::Rejected(format!("record {key} cannot be edited")));
            }
            let mut payload = table.row(&id).map(|r| r.into_data()).unwrap_or_default();
            payload.extend(parse_assignments(&fields)?);
            settle(&table, table.submit(payload).await)?;
            if let Some(row) = table.row(&id) {
                println!("{}", render::record(row.data()));
            }
        }
        Command::Delete { keys } => {
            for key in keys {
                let id = locate(&table, &primary_key, &key).await?;
                match table.delete(&id).await {
                    Outcome::Cancelled => println!("kept {key}"),
                    outcome => {
                        settle(&table, outcome)?;
                        println!("deleted {key}");
                    }
                }
            }
        }
    }

    save_records(&args.data, &store.records())
}

/// Turns a failed outcome into the alert the controller raised.
fn settle(table: &TableController<JsonRecord>, outcome: Outcome) -> Result<()> {
    match (outcome, table.alert()) {
        (Outcome::Failed, Some(alert)) => Err(CliError::Rejected(alert.message)),
        (Outcome::Failed, None) => Err(CliError::Rejected("operation failed".into())),
        _ => Ok(()),
    }
}

/// Narrows the table down to the record with `key` and returns its row.
async fn locate(table: &TableController<JsonRecord>, field: &str, key: &str) -> Result<RowId> {
    if !table.set_column_filter(field, Value::String(key.to_string())) {
        return Err(CliError::UnknownColumn(field.to_string()));
    }
    settle(table, table.apply_filters().await)?;
    table
        .rows()
        .first()
        .map(|row| row.id().clone())
        .ok_or_else(|| CliError::NoSuchRecord {
            field: field.to_string(),
            key: key.to_string(),
        })
}

/// One column per field seen in the data, primary key first.
fn columns_of(records: &[JsonRecord], primary_key: &str) -> Vec<Column<JsonRecord>> {
    let mut fields: Vec<&str> = vec![primary_key];
    for record in records {
        for field in record.keys() {
            if !fields.contains(&field.as_str()) {
                fields.push(field.as_str());
            }
        }
    }
    fields
        .into_iter()
        .map(|field| Column::field(field, field).sortable().filter(InputKind::Text))
        .collect()
}

/// Splits `FIELD=VALUE` pairs. Values are read as JSON when they parse, as text otherwise.
fn parse_assignments(items: &[String]) -> Result<Vec<(String, Value)>> {
    items
        .iter()
        .map(|item| {
            let (field, raw) = item
                .split_once('=')
                .filter(|(field, _)| !field.trim().is_empty())
                .ok_or_else(|| CliError::Assignment(item.clone()))?;
            let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
            Ok((field.trim().to_string(), value))
        })
        .collect()
}

fn load_records(path: &Path) -> Result<Vec<JsonRecord>> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&text).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let Value::Array(items) = value else {
        return Err(CliError::NotRecords(path.to_path_buf()));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(record) => Ok(record),
            _ => Err(CliError::NotRecords(path.to_path_buf())),
        })
        .collect()
}

fn load_config(path: &Path) -> Result<TableConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn save_records(path: &Path, records: &[JsonRecord]) -> Result<()> {
    let text = serde_json::to_string_pretty(records).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, text + "\n").map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("saved {} records to {}", records.len(), path.display());
    Ok(())
}
