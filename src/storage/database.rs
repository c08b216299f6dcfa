//! Transactional engine contract.
//!
//! Tables never touch SQLite directly. They describe their work as a
//! [`Transaction`] of ordered [`Statement`]s and hand it to a [`Database`],
//! which executes all statements atomically and reports rows for `Step`
//! statements.

use crate::error::Result;

/// How the engine should execute a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    /// Raw SQL, no bindings, no rows (DDL).
    Execute,
    /// Bound statement, no rows expected.
    Run,
    /// Query whose rows are returned, typed by `column_types`.
    Step,
}

/// Declared type of a result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int64,
    String,
}

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Int64(i64),
    String(String),
}

/// A typed column value in a result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnValue {
    Int64(i64),
    String(String),
    Null,
}

/// One result row, addressed by zero-based column index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub columns: Vec<ColumnValue>,
}

impl Row {
    #[must_use]
    pub fn new(columns: Vec<ColumnValue>) -> Self {
        Self { columns }
    }

    /// Integer at `index`; 0 when missing or not an integer.
    #[must_use]
    pub fn column_int64(&self, index: usize) -> i64 {
        match self.columns.get(index) {
            Some(ColumnValue::Int64(value)) => *value,
            _ => 0,
        }
    }

    /// String at `index`; empty when missing or not a string.
    #[must_use]
    pub fn column_string(&self, index: usize) -> String {
        match self.columns.get(index) {
            Some(ColumnValue::String(value)) => value.clone(),
            _ => String::new(),
        }
    }
}

/// A single statement inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub operation: OperationType,
    pub sql: String,
    pub bind_values: Vec<BindValue>,
    pub column_types: Vec<ColumnType>,
}

impl Statement {
    /// Raw DDL statement.
    #[must_use]
    pub fn execute(sql: impl Into<String>) -> Self {
        Self {
            operation: OperationType::Execute,
            sql: sql.into(),
            bind_values: Vec::new(),
            column_types: Vec::new(),
        }
    }

    /// Bound statement without result rows.
    #[must_use]
    pub fn run(sql: impl Into<String>, bind_values: Vec<BindValue>) -> Self {
        Self {
            operation: OperationType::Run,
            sql: sql.into(),
            bind_values,
            column_types: Vec::new(),
        }
    }

    /// Query returning rows typed by `column_types`.
    #[must_use]
    pub fn step(
        sql: impl Into<String>,
        bind_values: Vec<BindValue>,
        column_types: Vec<ColumnType>,
    ) -> Self {
        Self {
            operation: OperationType::Step,
            sql: sql.into(),
            bind_values,
            column_types,
        }
    }
}

/// Ordered statements that commit together or not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    pub statements: Vec<Statement>,
}

impl Transaction {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }
}

/// Outcome of a committed transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionResult {
    /// Rows produced by the last `Step` statement, if any.
    pub rows: Vec<Row>,
}

/// The transactional execution engine.
///
/// Implementations must run every statement of one transaction in order and
/// atomically. Submitting returns immediately with a future; the caller is
/// resumed when the engine finishes. A failure rolls back the whole
/// transaction and is reported as `Err`.
pub trait Database: Send + Sync {
    fn run_transaction(
        &self,
        transaction: Transaction,
    ) -> impl std::future::Future<Output = Result<TransactionResult>> + Send;
}
