//! Ad history settings.
//!
//! Loaded from and saved to a JSON file. The store holds a [`ConfigHandle`]
//! and reads it on every call, so a reload takes effect immediately and never
//! requires a schema migration.

use crate::error::{Error, Result};
use crate::notifier::{AdsClientEvent, AdsClientObserver};
use crate::storage::codec::COLUMN_COUNT;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

pub const DEFAULT_RETENTION_PERIOD_DAYS: u32 = 30;
pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const MAX_RETENTION_PERIOD_DAYS: u32 = 36_500;

/// Bundled SQLite limit on bound parameters per statement.
pub const MAX_BOUND_PARAMETERS: usize = 32_766;

/// Largest batch whose insert stays within [`MAX_BOUND_PARAMETERS`].
pub const MAX_BATCH_SIZE: usize = MAX_BOUND_PARAMETERS / COLUMN_COUNT;

/// Preference path prefix for ad history settings.
pub const PREF_PREFIX: &str = "ad_history.";

/// Reloadable ad history settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdHistoryConfig {
    /// Rows older than this many days are purged
    pub retention_period_days: u32,

    /// Maximum rows per insert statement
    pub batch_size: usize,
}

impl Default for AdHistoryConfig {
    fn default() -> Self {
        Self {
            retention_period_days: DEFAULT_RETENTION_PERIOD_DAYS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl AdHistoryConfig {
    /// Check the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the batch size is zero or above
    /// [`MAX_BATCH_SIZE`], or the retention period is above
    /// [`MAX_RETENTION_PERIOD_DAYS`].
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidArgument(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        if self.batch_size > MAX_BATCH_SIZE {
            return Err(Error::InvalidArgument(format!(
                "batch_size must be at most {MAX_BATCH_SIZE}"
            )));
        }
        if self.retention_period_days > MAX_RETENTION_PERIOD_DAYS {
            return Err(Error::InvalidArgument(format!(
                "retention_period_days must be at most {MAX_RETENTION_PERIOD_DAYS}"
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn retention_period(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.retention_period_days))
    }

    /// Purge cutoff: `now` minus the retention period.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the cutoff falls outside the representable range.
    pub fn retention_cutoff(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        now.checked_sub_signed(self.retention_period()).ok_or_else(|| {
            Error::Config(format!(
                "retention_period_days {} is out of range",
                self.retention_period_days
            ))
        })
    }

    /// Batch size, falling back to the default when zero and capped at
    /// [`MAX_BATCH_SIZE`].
    #[must_use]
    pub const fn effective_batch_size(&self) -> usize {
        if self.batch_size == 0 {
            DEFAULT_BATCH_SIZE
        } else if self.batch_size > MAX_BATCH_SIZE {
            MAX_BATCH_SIZE
        } else {
            self.batch_size
        }
    }
}

/// Load settings from `path`. A missing file yields the defaults.
///
/// # Errors
///
/// Returns `Config` if the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<AdHistoryConfig> {
    if !path.exists() {
        return Ok(AdHistoryConfig::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {e}")))
}

/// Save settings to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the settings are invalid or the file cannot be written.
pub fn save_config(path: &Path, config: &AdHistoryConfig) -> Result<()> {
    config.validate()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
    }

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;

    fs::write(path, content)
        .map_err(|e| Error::Config(format!("Failed to write config file: {e}")))?;

    Ok(())
}

/// Shared, reloadable settings.
///
/// Clones share the same underlying value.
#[derive(Debug, Clone, Default)]
pub struct ConfigHandle {
    inner: Arc<RwLock<AdHistoryConfig>>,
    path: Option<PathBuf>,
}

impl ConfigHandle {
    /// In-memory settings with no backing file.
    #[must_use]
    pub fn new(config: AdHistoryConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
            path: None,
        }
    }

    /// Settings backed by the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be loaded.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = load_config(&path)?;
        Ok(Self {
            inner: Arc::new(RwLock::new(config)),
            path: Some(path),
        })
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Current settings.
    #[must_use]
    pub fn get(&self) -> AdHistoryConfig {
        match self.inner.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Replace the in-memory settings.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `config` fails validation.
    pub fn set(&self, config: AdHistoryConfig) -> Result<()> {
        config.validate()?;
        match self.inner.write() {
            Ok(mut guard) => *guard = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
        Ok(())
    }

    /// Re-read the backing file. A handle without a file is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or holds invalid settings.
    pub fn reload(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let config = load_config(path)?;
        self.set(config)?;
        info!(
            retention_period_days = config.retention_period_days,
            batch_size = config.batch_size,
            "Reloaded ad history config"
        );
        Ok(())
    }

    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.get().effective_batch_size()
    }
}

/// Reloads a [`ConfigHandle`] when an ad history preference changes.
#[derive(Debug, Clone)]
pub struct ConfigReloader {
    handle: ConfigHandle,
}

impl ConfigReloader {
    #[must_use]
    pub fn new(handle: ConfigHandle) -> Self {
        Self { handle }
    }
}

impl AdsClientObserver for ConfigReloader {
    fn on_event(&self, event: &AdsClientEvent) {
        let AdsClientEvent::PrefDidChange { path } = event else {
            return;
        };
        if !path.starts_with(PREF_PREFIX) {
            return;
        }

        if let Err(e) = self.handle.reload() {
            // Keep serving the previous settings
            warn!(pref = %path, error = %e, "Failed to reload ad history config");
        }
    }
}
