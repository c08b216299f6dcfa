//! Command implementations.

pub mod completions;
pub mod config;
pub mod creative;
pub mod history;
pub mod import;
pub mod init;
pub mod purge;
pub mod rank;
pub mod record;
pub mod version;

use crate::config::{ConfigHandle, resolve_config_path, resolve_db_path};
use crate::error::{Error, Result};
use crate::model::AdHistoryItem;
use crate::storage::{AdsDatabase, SqliteDatabase};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

/// Output for commands that list ad history items.
#[derive(Serialize)]
struct HistoryOutput<'a> {
    items: &'a [AdHistoryItem],
    count: usize,
}

/// Create a tokio runtime for the async store operations.
fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))
}

/// Load the settings file into a shared handle.
fn load_config_handle(config_path: Option<&Path>) -> Result<ConfigHandle> {
    match resolve_config_path(config_path) {
        Some(path) => ConfigHandle::from_file(path),
        None => Ok(ConfigHandle::default()),
    }
}

/// Open an existing database and bring its schema up to date.
async fn open_database(
    db_path: Option<&Path>,
    config: ConfigHandle,
) -> Result<AdsDatabase<SqliteDatabase>> {
    let db_path = resolve_db_path(db_path).ok_or(Error::NotInitialized)?;

    if !db_path.exists() {
        return Err(Error::NotInitialized);
    }

    let db = SqliteDatabase::open(&db_path)?;
    AdsDatabase::open(db, config).await
}

/// Print ad history items as JSON or one line per item.
fn print_history(items: &[AdHistoryItem], json: bool) -> Result<()> {
    if json {
        let output = HistoryOutput {
            items,
            count: items.len(),
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No ad history found.");
        return Ok(());
    }

    for item in items {
        println!(
            "{}  {} {:<20} {}  {}",
            item.created_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            format!("{:<10}", item.confirmation_type.as_str()).yellow(),
            item.ad_type.as_str(),
            item.placement_id.bold(),
            item.target_url_str().dimmed(),
        );
    }
    println!("{} item(s)", items.len());

    Ok(())
}
