//! Configuration management.
//!
//! This module resolves where the ad history database and its settings file
//! live, and provides the reloadable [`ConfigHandle`] the store reads its
//! retention period and batch size from.
//!
//! Locations come from the platform's project directories (for example
//! `~/.local/share/adh/` and `~/.config/adh/` on Linux) unless overridden.

mod settings;

pub use settings::{
    AdHistoryConfig, ConfigHandle, ConfigReloader, DEFAULT_BATCH_SIZE,
    DEFAULT_RETENTION_PERIOD_DAYS, PREF_PREFIX, load_config, save_config,
};

use std::path::{Path, PathBuf};

/// Environment variable overriding the database path.
pub const DB_ENV: &str = "ADH_DB";

/// Environment variable overriding the config file path.
pub const CONFIG_ENV: &str = "ADH_CONFIG";

const DB_FILE_NAME: &str = "ad_history.db";
const CONFIG_FILE_NAME: &str = "config.json";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "adh")
}

/// Read a non-blank environment variable as a path.
fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

/// Resolve the database path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `ADH_DB` environment variable
/// 3. Platform data directory: `<data dir>/ad_history.db`
///
/// # Returns
///
/// Returns the path to the database file, or `None` if no location found.
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if let Some(path) = env_path(DB_ENV) {
        return Some(path);
    }

    project_dirs().map(|dirs| dirs.data_dir().join(DB_FILE_NAME))
}

/// Resolve the config file path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `ADH_CONFIG` environment variable
/// 3. Platform config directory: `<config dir>/config.json`
#[must_use]
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if let Some(path) = env_path(CONFIG_ENV) {
        return Some(path);
    }

    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
