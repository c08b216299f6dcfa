//! Database schema definitions.
//!
//! Timestamps are stored as INTEGER platform microseconds (see
//! [`crate::timestamp`]). Every statement uses `IF NOT EXISTS` so replaying
//! any version's DDL is a no-op.

/// Schema version this build creates and migrates to.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Version bookkeeping table, one row per applied version.
pub const SCHEMA_MIGRATIONS_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at INTEGER NOT NULL
);";

/// Name of the ad history table.
pub const AD_HISTORY_TABLE: &str = "ad_history";

/// Ad history table as introduced in version 1.
///
/// Column order matches [`crate::storage::codec::COLUMNS`]. The identity
/// column is never selected.
pub const AD_HISTORY_TABLE_SQL: &str = "
CREATE TABLE IF NOT EXISTS ad_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    created_at INTEGER NOT NULL,
    ad_type TEXT NOT NULL,
    confirmation_type TEXT NOT NULL,
    placement_id TEXT NOT NULL,
    creative_instance_id TEXT NOT NULL,
    creative_set_id TEXT NOT NULL,
    campaign_id TEXT NOT NULL,
    advertiser_id TEXT NOT NULL,
    segment TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    target_url TEXT NOT NULL
);";

/// Schema version as threaded through store construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaVersion(pub u32);

impl SchemaVersion {
    pub const NONE: Self = Self(0);
    pub const CURRENT: Self = Self(CURRENT_SCHEMA_VERSION);

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// True if the stored schema is at or beyond what this build knows.
    #[must_use]
    pub const fn is_current(self) -> bool {
        self.0 >= CURRENT_SCHEMA_VERSION
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}
