//! Import ad events from a JSON file.

use crate::error::{Error, Result};
use crate::model::AdHistoryItem;
use serde::Serialize;
use std::fs;
use std::path::Path;

use super::{load_config_handle, open_database, runtime};

#[derive(Serialize)]
struct ImportOutput {
    imported: usize,
    skipped: usize,
}

/// Execute the import command.
///
/// Items that are not valid are skipped by the store; the rest are saved in
/// one transaction.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or the items
/// cannot be saved.
pub fn execute(
    file: &Path,
    db_path: Option<&Path>,
    config_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let content = fs::read_to_string(file)?;
    let items: Vec<AdHistoryItem> = serde_json::from_str(&content).map_err(|e| {
        Error::InvalidArgument(format!(
            "{} is not a JSON array of ad history items: {e}",
            file.display()
        ))
    })?;

    let imported = items.iter().filter(|item| item.is_valid()).count();
    let skipped = items.len() - imported;

    let config = load_config_handle(config_path)?;
    let rt = runtime()?;
    rt.block_on(async {
        let ads = open_database(db_path, config).await?;
        ads.ad_history().save(&items).await
    })?;

    if json {
        let output = ImportOutput { imported, skipped };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Imported {imported} item(s) from {}", file.display());
        if skipped > 0 {
            println!("  Skipped {skipped} invalid item(s)");
        }
    }

    Ok(())
}
