//! Statement building helpers shared by all tables.

use crate::storage::database::{Statement, Transaction};

/// Build `(?, ?, ...), (?, ?, ...)` for a multi-row insert.
///
/// Produces `row_count` tuples of `column_count` placeholders each. Callers
/// derive `row_count` from the rows they actually bound, so the placeholder
/// count always equals the bound value count.
#[must_use]
pub fn build_bind_column_placeholders(column_count: usize, row_count: usize) -> String {
    let tuple = format!("({})", vec!["?"; column_count].join(", "));
    vec![tuple; row_count].join(", ")
}

/// Index name for `table` over `columns`, e.g. `ad_history_created_at_index`.
#[must_use]
pub fn table_index_name(table_name: &str, columns: &[&str]) -> String {
    format!("{table_name}_{}_index", columns.join("_"))
}

/// Append an idempotent `CREATE INDEX` statement.
pub fn create_table_index(transaction: &mut Transaction, table_name: &str, columns: &[&str]) {
    transaction.push(Statement::execute(format!(
        "CREATE INDEX IF NOT EXISTS {} ON {table_name}({});",
        table_index_name(table_name, columns),
        columns.join(", ")
    )));
}

/// Append a raw DDL statement.
pub fn execute(transaction: &mut Transaction, sql: impl Into<String>) {
    transaction.push(Statement::execute(sql));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::OperationType;

    #[test]
    fn test_placeholders() {
        assert_eq!(build_bind_column_placeholders(2, 1), "(?, ?)");
        assert_eq!(build_bind_column_placeholders(3, 2), "(?, ?, ?), (?, ?, ?)");
        assert_eq!(build_bind_column_placeholders(12, 50).matches('?').count(), 600);
    }

    #[test]
    fn test_create_table_index() {
        let mut tx = Transaction::new();
        create_table_index(&mut tx, "ad_history", &["placement_id"]);

        assert_eq!(tx.len(), 1);
        assert_eq!(tx.statements[0].operation, OperationType::Execute);
        assert_eq!(
            tx.statements[0].sql,
            "CREATE INDEX IF NOT EXISTS ad_history_placement_id_index ON ad_history(placement_id);"
        );
    }
}
