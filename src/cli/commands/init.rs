//! Create the ad history database.

use crate::config::resolve_db_path;
use crate::error::{Error, Result};
use crate::storage::{AdsDatabase, SqliteDatabase};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::{load_config_handle, runtime};

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    schema_version: u32,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns `AlreadyInitialized` if the database exists and `force` is not
/// set, or an error if the database cannot be created.
pub fn execute(
    force: bool,
    db_path: Option<&Path>,
    config_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let db_path = resolve_db_path(db_path).ok_or_else(|| {
        Error::Config("Could not determine database location".to_string())
    })?;

    if db_path.exists() {
        if !force {
            return Err(Error::AlreadyInitialized { path: db_path });
        }
        remove_database(&db_path)?;
    }

    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let config = load_config_handle(config_path)?;
    let rt = runtime()?;
    let ads = rt.block_on(async {
        let db = SqliteDatabase::open(&db_path)?;
        AdsDatabase::open(db, config).await
    })?;

    if json {
        let output = InitOutput {
            database: db_path,
            schema_version: ads.schema_version().get(),
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Initialized ad history database");
        println!("  Database: {}", db_path.display());
        println!("  Schema:   {}", ads.schema_version());
    }

    Ok(())
}

/// Remove a database file and its WAL companions.
fn remove_database(db_path: &Path) -> Result<()> {
    fs::remove_file(db_path)?;

    for suffix in ["-wal", "-shm"] {
        let mut companion = db_path.as_os_str().to_owned();
        companion.push(suffix);
        let companion = PathBuf::from(companion);
        if companion.exists() {
            fs::remove_file(companion)?;
        }
    }

    Ok(())
}
