use chrono::{Local, TimeZone};
use clap::ValueEnum;

use cuidapadres::config::Config;
use cuidapadres::db::LocalStore;
use cuidapadres::models::{Nurse, Record};
use cuidapadres::sync::{save_record, RemoteClient};

mod checklist;
mod config_cmd;
mod history;
mod medicine;
mod report;
mod sync_cmd;
mod vitals;

pub use checklist::ChecklistCommand;
pub use config_cmd::ConfigCommand;
pub use history::HistoryCommand;
pub use medicine::{MedicineCommand, MedicineSubcommand};
pub use report::{ReportCommand, ReportSubcommand};
pub use sync_cmd::SyncCommand;
pub use vitals::{VitalsCommand, VitalsSubcommand};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub(crate) fn open_store(config: &Config) -> LocalStore {
    LocalStore::new(config.data_dir.value.clone())
}

/// Nurse from `--nurse`, falling back to the configured default.
pub(crate) fn resolve_nurse(
    arg: Option<Nurse>,
    config: &Config,
) -> Result<Nurse, Box<dyn std::error::Error>> {
    arg.or(config.nurse.value).ok_or_else(|| {
        "--nurse is required (or set `nurse` in the config file / CUIDA_NURSE)".into()
    })
}

/// Saves a record locally and pushes it when a remote is configured.
pub(crate) fn save<T: Record>(config: &Config, record: T) -> Result<T, Box<dyn std::error::Error>> {
    let store = open_store(config);
    let remote = RemoteClient::from_config(&config.remote).ok();

    let rt = tokio::runtime::Runtime::new()?;
    let saved = rt.block_on(save_record(&store, remote.as_ref(), record))?;
    Ok(saved)
}

pub(crate) fn sync_state(record: &impl Record) -> &'static str {
    if record.is_synced() {
        "synced"
    } else {
        "saved locally, pending sync"
    }
}

/// Local `YYYY-MM-DD HH:MM` for a millisecond timestamp.
pub(crate) fn format_timestamp(timestamp: i64) -> String {
    Local
        .timestamp_millis_opt(timestamp)
        .single()
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}
