//! Purge expired ad history.

use crate::error::Result;
use crate::timestamp;
use serde::Serialize;
use std::path::Path;

use super::{load_config_handle, open_database, runtime};

#[derive(Serialize)]
struct PurgeOutput {
    retention_period_days: u32,
    cutoff: String,
}

/// Execute the purge command.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the delete fails.
pub fn execute(db_path: Option<&Path>, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config_handle(config_path)?;
    let settings = config.get();
    let now = timestamp::now();
    let cutoff = settings.retention_cutoff(now)?;

    let rt = runtime()?;
    rt.block_on(async {
        let ads = open_database(db_path, config).await?;
        ads.ad_history().purge_expired_at(now).await
    })?;

    if json {
        let output = PurgeOutput {
            retention_period_days: settings.retention_period_days,
            cutoff: cutoff.to_rfc3339(),
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!(
            "Purged ad history created on or before {} ({} day retention)",
            cutoff.format("%Y-%m-%d %H:%M:%S"),
            settings.retention_period_days
        );
    }

    Ok(())
}
