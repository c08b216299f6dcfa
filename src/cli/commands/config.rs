//! Show or change ad history settings.
//!
//! `config set` writes the file and then announces each changed preference
//! through an [`AdsClientNotifier`], so any registered [`ConfigReloader`]
//! picks up the new values.

use crate::cli::ConfigCommands;
use crate::config::{
    AdHistoryConfig, ConfigHandle, ConfigReloader, PREF_PREFIX, resolve_config_path, save_config,
};
use crate::error::{Error, Result};
use crate::notifier::{AdsClientEvent, AdsClientNotifier, AdsClientObserver};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Serialize)]
struct ConfigOutput<'a> {
    path: &'a Path,
    #[serde(flatten)]
    config: AdHistoryConfig,
}

/// Execute config commands.
///
/// # Errors
///
/// Returns an error if the settings file cannot be located, read, or written.
pub fn execute(command: &ConfigCommands, config_path: Option<&Path>, json: bool) -> Result<()> {
    let path = resolve_config_path(config_path)
        .ok_or_else(|| Error::Config("Could not determine config location".to_string()))?;

    match command {
        ConfigCommands::Show => {
            let handle = ConfigHandle::from_file(&path)?;
            print_config(&path, handle.get(), json)
        }
        ConfigCommands::Set {
            retention_days,
            batch_size,
        } => set(&path, *retention_days, *batch_size, json),
    }
}

fn set(
    path: &Path,
    retention_days: Option<u32>,
    batch_size: Option<usize>,
    json: bool,
) -> Result<()> {
    let handle = ConfigHandle::from_file(path)?;
    let current = handle.get();

    let updated = AdHistoryConfig {
        retention_period_days: retention_days.unwrap_or(current.retention_period_days),
        batch_size: batch_size.unwrap_or(current.batch_size),
    };
    save_config(path, &updated)?;

    let reloader: Arc<dyn AdsClientObserver> = Arc::new(ConfigReloader::new(handle.clone()));
    let mut notifier = AdsClientNotifier::new();
    notifier.add_observer(&reloader);

    for pref in changed_prefs(&current, &updated) {
        notifier.notify(&AdsClientEvent::PrefDidChange { path: pref });
    }

    print_config(path, handle.get(), json)
}

/// Preference paths whose values differ.
fn changed_prefs(before: &AdHistoryConfig, after: &AdHistoryConfig) -> Vec<String> {
    let mut prefs = Vec::new();
    if before.retention_period_days != after.retention_period_days {
        prefs.push(format!("{PREF_PREFIX}retention_period_days"));
    }
    if before.batch_size != after.batch_size {
        prefs.push(format!("{PREF_PREFIX}batch_size"));
    }
    prefs
}

fn print_config(path: &Path, config: AdHistoryConfig, json: bool) -> Result<()> {
    if json {
        let output = ConfigOutput { path, config };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Config: {}", path.display());
        println!("  retention_period_days: {}", config.retention_period_days);
        println!("  batch_size:            {}", config.batch_size);
    }
    Ok(())
}
