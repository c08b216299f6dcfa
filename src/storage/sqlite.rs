//! SQLite engine implementation.
//!
//! Executes [`Transaction`]s against a rusqlite connection. Each transaction
//! runs inside an IMMEDIATE SQLite transaction on the blocking thread pool,
//! so submitting never blocks the caller's task.

use crate::error::{Error, Result};
use crate::storage::database::{
    BindValue, ColumnType, ColumnValue, Database, OperationType, Row, Statement, Transaction,
    TransactionResult,
};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, ToSql, TransactionBehavior, params_from_iter};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// SQLite-based transactional engine.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDatabase {
    /// Open a database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or the
    /// journal mode cannot be set.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;

        if let Some(timeout) = timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        } else {
            // Default 5 second timeout
            conn.busy_timeout(Duration::from_secs(5))?;
        }

        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }
}

impl Database for SqliteDatabase {
    fn run_transaction(
        &self,
        transaction: Transaction,
    ) -> impl std::future::Future<Output = Result<TransactionResult>> + Send {
        let conn = Arc::clone(&self.conn);

        async move {
            tokio::task::spawn_blocking(move || {
                let mut conn = conn
                    .lock()
                    .map_err(|_| Error::Other("Database connection lock poisoned".to_string()))?;
                execute_transaction(&mut conn, &transaction)
            })
            .await
            .map_err(|e| Error::TransactionFailed(format!("engine task failed: {e}")))?
        }
    }
}

/// Execute every statement in order, committing only if all succeed.
///
/// Dropping the rusqlite transaction on an early return rolls it back.
fn execute_transaction(
    conn: &mut Connection,
    transaction: &Transaction,
) -> Result<TransactionResult> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut result = TransactionResult::default();

    for (index, statement) in transaction.statements.iter().enumerate() {
        debug!(
            index,
            operation = ?statement.operation,
            binds = statement.bind_values.len(),
            "Executing statement"
        );

        let outcome = match statement.operation {
            OperationType::Execute => tx.execute_batch(&statement.sql),
            OperationType::Run => tx
                .prepare(&statement.sql)
                .and_then(|mut stmt| stmt.execute(params_from_iter(statement.bind_values.iter())))
                .map(|_| ()),
            OperationType::Step => query_rows(&tx, statement).map(|rows| result.rows = rows),
        };

        if let Err(e) = outcome {
            warn!(index, error = %e, "Statement failed, rolling back transaction");
            return Err(Error::Database(e));
        }
    }

    tx.commit()?;
    Ok(result)
}

fn query_rows(conn: &Connection, statement: &Statement) -> rusqlite::Result<Vec<Row>> {
    let mut stmt = conn.prepare(&statement.sql)?;
    let mut rows = stmt.query(params_from_iter(statement.bind_values.iter()))?;

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut columns = Vec::with_capacity(statement.column_types.len());
        for (index, column_type) in statement.column_types.iter().enumerate() {
            columns.push(to_column_value(*column_type, row.get_ref(index)?));
        }
        out.push(Row::new(columns));
    }

    Ok(out)
}

/// Convert a raw SQLite value to the declared column type.
///
/// A value whose storage class does not match the declaration becomes
/// `Null`; the decoder decides what to make of it.
fn to_column_value(column_type: ColumnType, value: ValueRef<'_>) -> ColumnValue {
    match (column_type, value) {
        (ColumnType::Int64, ValueRef::Integer(v)) => ColumnValue::Int64(v),
        (ColumnType::String, ValueRef::Text(bytes)) => {
            ColumnValue::String(String::from_utf8_lossy(bytes).into_owned())
        }
        _ => ColumnValue::Null,
    }
}

impl ToSql for BindValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Self::Int64(value) => Ok(ToSqlOutput::from(*value)),
            Self::String(value) => Ok(ToSqlOutput::from(value.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_table() -> Statement {
        Statement::execute(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, n INTEGER NOT NULL, s TEXT NOT NULL);",
        )
    }

    fn select_all() -> Statement {
        Statement::step(
            "SELECT n, s FROM t ORDER BY n;",
            vec![],
            vec![ColumnType::Int64, ColumnType::String],
        )
    }

    #[tokio::test]
    async fn test_run_then_step() {
        let db = SqliteDatabase::open_memory().unwrap();

        let mut tx = Transaction::new();
        tx.push(create_table());
        tx.push(Statement::run(
            "INSERT INTO t (n, s) VALUES (?, ?), (?, ?);",
            vec![
                BindValue::Int64(2),
                BindValue::String("two".to_string()),
                BindValue::Int64(1),
                BindValue::String("one".to_string()),
            ],
        ));
        db.run_transaction(tx).await.unwrap();

        let mut tx = Transaction::new();
        tx.push(select_all());
        let result = db.run_transaction(tx).await.unwrap();

        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0].column_int64(0), 1);
        assert_eq!(result.rows[0].column_string(1), "one");
        assert_eq!(result.rows[1].column_string(1), "two");
    }

    #[tokio::test]
    async fn test_failed_statement_rolls_back_whole_transaction() {
        let db = SqliteDatabase::open_memory().unwrap();

        let mut tx = Transaction::new();
        tx.push(create_table());
        db.run_transaction(tx).await.unwrap();

        let mut tx = Transaction::new();
        tx.push(Statement::run(
            "INSERT INTO t (n, s) VALUES (?, ?);",
            vec![BindValue::Int64(1), BindValue::String("kept?".to_string())],
        ));
        // Placeholder/bind count mismatch fails the second statement
        tx.push(Statement::run(
            "INSERT INTO t (n, s) VALUES (?, ?);",
            vec![BindValue::Int64(2)],
        ));
        let result = db.run_transaction(tx).await;
        assert!(matches!(result, Err(Error::Database(_))));

        let mut tx = Transaction::new();
        tx.push(select_all());
        let rows = db.run_transaction(tx).await.unwrap().rows;
        assert!(rows.is_empty(), "first insert must not survive the rollback");
    }

    #[tokio::test]
    async fn test_mistyped_column_becomes_null() {
        let db = SqliteDatabase::open_memory().unwrap();

        let mut tx = Transaction::new();
        tx.push(create_table());
        // Text in the integer column and a blob in the text column
        tx.push(Statement::execute("INSERT INTO t (n, s) VALUES ('oops', X'00');"));
        tx.push(select_all());
        let rows = db.run_transaction(tx).await.unwrap().rows;

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].columns, vec![ColumnValue::Null, ColumnValue::Null]);
    }

    #[tokio::test]
    async fn test_file_database_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let db = SqliteDatabase::open(&dir.path().join("ads.db")).unwrap();

        let mut tx = Transaction::new();
        tx.push(Statement::step(
            "PRAGMA journal_mode;",
            vec![],
            vec![ColumnType::String],
        ));
        let rows = db.run_transaction(tx).await.unwrap().rows;
        assert_eq!(rows[0].column_string(0), "wal");
    }
}
