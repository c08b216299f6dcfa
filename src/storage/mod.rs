//! Ad history storage layer.
//!
//! Tables describe their work as [`database::Transaction`]s and hand them to
//! a [`database::Database`] engine; [`sqlite::SqliteDatabase`] is the
//! production engine.
//!
//! # Submodules
//!
//! - [`ad_history`] - The ad history record store
//! - [`codec`] - Column encoding for ad history rows
//! - [`database`] - Transactional engine contract
//! - [`migrations`] - Schema version coordination
//! - [`schema`] - DDL and schema version constants
//! - [`sql`] - Shared statement builders
//! - [`sqlite`] - SQLite engine

pub mod ad_history;
pub mod codec;
pub mod database;
pub mod migrations;
pub mod schema;
pub mod sql;
pub mod sqlite;

pub use ad_history::AdHistoryTable;
pub use database::Database;
pub use schema::{CURRENT_SCHEMA_VERSION, SchemaVersion};
pub use sqlite::SqliteDatabase;

use crate::config::ConfigHandle;
use crate::error::Result;

/// All ads tables over one engine, opened at a known schema version.
#[derive(Debug, Clone)]
pub struct AdsDatabase<D> {
    ad_history: AdHistoryTable<D>,
    schema_version: SchemaVersion,
}

impl<D: Database + Clone> AdsDatabase<D> {
    /// Bring the schema up to date and construct the tables.
    ///
    /// Must complete before any table is queried.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be initialized.
    pub async fn open(db: D, config: ConfigHandle) -> Result<Self> {
        let ad_history = AdHistoryTable::new(db.clone(), config);
        let schema_version = migrations::initialize(&db, &[&ad_history]).await?;

        Ok(Self {
            ad_history,
            schema_version,
        })
    }

    #[must_use]
    pub fn ad_history(&self) -> &AdHistoryTable<D> {
        &self.ad_history
    }

    #[must_use]
    pub fn schema_version(&self) -> SchemaVersion {
        self.schema_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_reports_current_version() {
        let db = SqliteDatabase::open_memory().unwrap();
        let ads = AdsDatabase::open(db.clone(), ConfigHandle::default())
            .await
            .unwrap();
        assert_eq!(ads.schema_version(), SchemaVersion::CURRENT);

        // Reopening the same engine does not migrate again
        let reopened = AdsDatabase::open(db, ConfigHandle::default()).await.unwrap();
        assert_eq!(reopened.schema_version(), SchemaVersion::CURRENT);
        assert!(
            reopened
                .ad_history()
                .get_for_creative_instance_id("none")
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_open_creates_indexes() {
        let db = SqliteDatabase::open_memory().unwrap();
        AdsDatabase::open(db.clone(), ConfigHandle::default())
            .await
            .unwrap();

        let mut transaction = database::Transaction::new();
        transaction.push(database::Statement::step(
            "SELECT name FROM sqlite_master \
             WHERE type = 'index' AND tbl_name = 'ad_history' ORDER BY name;",
            Vec::new(),
            vec![database::ColumnType::String],
        ));
        let names: Vec<String> = db
            .run_transaction(transaction)
            .await
            .unwrap()
            .rows
            .iter()
            .map(|row| row.column_string(0))
            .collect();

        assert_eq!(
            names,
            vec![
                "ad_history_confirmation_type_index",
                "ad_history_created_at_index",
                "ad_history_creative_instance_id_index",
                "ad_history_placement_id_index",
            ]
        );
    }
}
