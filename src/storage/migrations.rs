//! Schema version coordination.
//!
//! Each table implements [`TableInterface`]. [`initialize`] runs once when
//! the store is opened, before any ordinary query: it creates every table on
//! a fresh database, or applies each missing version's migration in
//! ascending order, and records the applied versions in `schema_migrations`.
//! Everything happens in one transaction.

use crate::error::Result;
use crate::storage::database::{BindValue, ColumnType, Database, Statement, Transaction};
use crate::storage::schema::{CURRENT_SCHEMA_VERSION, SCHEMA_MIGRATIONS_SQL, SchemaVersion};
use tracing::{debug, info, warn};

/// Lifecycle hooks for one table.
///
/// Both hooks only append statements; the coordinator owns execution.
pub trait TableInterface: Send + Sync {
    fn table_name(&self) -> &'static str;

    /// Append the full DDL for the current version.
    fn create(&self, transaction: &mut Transaction);

    /// Append the incremental DDL introduced by `to_version`.
    ///
    /// Versions the table does not recognise must append nothing.
    fn migrate(&self, transaction: &mut Transaction, to_version: u32);
}

/// Read the highest recorded schema version, or [`SchemaVersion::NONE`].
///
/// # Errors
///
/// Returns an error if the engine fails.
pub async fn stored_version<D: Database>(db: &D) -> Result<SchemaVersion> {
    let mut transaction = Transaction::new();
    transaction.push(Statement::execute(SCHEMA_MIGRATIONS_SQL));
    transaction.push(Statement::step(
        "SELECT MAX(version) FROM schema_migrations;",
        Vec::new(),
        vec![ColumnType::Int64],
    ));

    let result = db.run_transaction(transaction).await?;
    let version = result
        .rows
        .first()
        .map_or(0, |row| row.column_int64(0));

    Ok(SchemaVersion(u32::try_from(version).unwrap_or(0)))
}

/// Bring the schema up to [`CURRENT_SCHEMA_VERSION`].
///
/// Returns the version in effect afterwards. A stored version newer than
/// this build knows is left untouched.
///
/// # Errors
///
/// Returns an error if the engine fails; the transaction is rolled back and
/// the stored version is unchanged.
pub async fn initialize<D: Database>(
    db: &D,
    tables: &[&dyn TableInterface],
) -> Result<SchemaVersion> {
    let stored = stored_version(db).await?;

    if stored.get() > CURRENT_SCHEMA_VERSION {
        warn!(
            stored = stored.get(),
            current = CURRENT_SCHEMA_VERSION,
            "Database schema is newer than this build, leaving it untouched"
        );
        return Ok(stored);
    }

    if stored.is_current() {
        debug!(version = stored.get(), "Schema is up to date");
        return Ok(stored);
    }

    let mut transaction = Transaction::new();
    let applied_at = chrono::Utc::now().timestamp_millis();

    if stored == SchemaVersion::NONE {
        for table in tables {
            info!(table = table.table_name(), "Creating table");
            table.create(&mut transaction);
        }
    } else {
        for to_version in stored.get() + 1..=CURRENT_SCHEMA_VERSION {
            info!(version = to_version, "Applying migration");
            for table in tables {
                table.migrate(&mut transaction, to_version);
            }
        }
    }

    for version in stored.get() + 1..=CURRENT_SCHEMA_VERSION {
        transaction.push(Statement::run(
            "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?, ?);",
            vec![
                BindValue::Int64(i64::from(version)),
                BindValue::Int64(applied_at),
            ],
        ));
    }

    db.run_transaction(transaction).await?;
    info!(
        from = stored.get(),
        to = CURRENT_SCHEMA_VERSION,
        "Schema migration complete"
    );

    Ok(SchemaVersion::CURRENT)
}
