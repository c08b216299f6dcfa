//! Ad history table.
//!
//! Stores one row per ad event. Writes are chunked into multi-row inserts of
//! at most `batch_size` rows, all inside a single transaction. Reads decode
//! every row and drop any that no longer form a valid item.
//!
//! The best-of-group query picks, per placement, the event with the lowest
//! positive placement rank (click 1, dismiss 2, view 3). It ranks rows in a
//! CTE and keeps those whose rank equals the per-placement minimum, so it
//! does not rely on window functions.

use crate::config::ConfigHandle;
use crate::error::Result;
use crate::model::{AdHistoryItem, AdHistoryList, PLACEMENT_RANKS};
use crate::storage::codec::{self, COLUMN_COUNT};
use crate::storage::database::{BindValue, Database, Statement, Transaction};
use crate::storage::migrations::TableInterface;
use crate::storage::schema::{AD_HISTORY_TABLE, AD_HISTORY_TABLE_SQL};
use crate::storage::sql::{build_bind_column_placeholders, create_table_index, execute};
use crate::timestamp::{self, to_platform_timestamp};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Columns with an index at the current version.
const INDEXED_COLUMNS: [&str; 4] = [
    "created_at",
    "confirmation_type",
    "placement_id",
    "creative_instance_id",
];

/// Ad history record store.
#[derive(Debug, Clone)]
pub struct AdHistoryTable<D> {
    db: D,
    config: ConfigHandle,
}

impl<D: Database> AdHistoryTable<D> {
    #[must_use]
    pub fn new(db: D, config: ConfigHandle) -> Self {
        Self { db, config }
    }

    /// Persist `items`.
    ///
    /// Invalid items are skipped. All batches commit together or not at
    /// all. An empty input, or one where every item is invalid, succeeds
    /// without touching the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to run the transaction.
    pub async fn save(&self, items: &[AdHistoryItem]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let batch_size = self.config.batch_size();
        let mut transaction = Transaction::new();
        for batch in items.chunks(batch_size) {
            insert(&mut transaction, batch);
        }

        if transaction.is_empty() {
            debug!("No valid ad history items to save");
            return Ok(());
        }

        debug!(
            items = items.len(),
            statements = transaction.len(),
            batch_size,
            "Saving ad history"
        );
        self.db.run_transaction(transaction).await?;
        Ok(())
    }

    /// All items created within `[from, to]`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to run the query.
    pub async fn get_for_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<AdHistoryList> {
        let sql = format!(
            "SELECT {} FROM {AD_HISTORY_TABLE} \
             WHERE created_at BETWEEN ? AND ? \
             ORDER BY created_at DESC;",
            codec::column_names()
        );

        self.select(sql, date_range_bind_values(from, to)).await
    }

    /// The highest ranked event per placement within `[from, to]`, newest
    /// first.
    ///
    /// Events whose confirmation type has no placement rank never win, even
    /// when they are the only event for their placement.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to run the query.
    pub async fn get_highest_ranked_placements_for_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<AdHistoryList> {
        let columns = codec::column_names();
        let sql = format!(
            "WITH ranked_ad_history AS (\
               SELECT {columns}, {rank} AS placement_rank \
               FROM {AD_HISTORY_TABLE} \
               WHERE created_at BETWEEN ? AND ?\
             ) \
             SELECT {columns} FROM ranked_ad_history AS candidate \
             WHERE candidate.placement_rank > 0 \
               AND candidate.placement_rank = (\
                 SELECT MIN(placement_rank) FROM ranked_ad_history \
                 WHERE placement_id = candidate.placement_id AND placement_rank > 0\
               ) \
             ORDER BY candidate.created_at DESC;",
            rank = placement_rank_case_expression(),
        );

        self.select(sql, date_range_bind_values(from, to)).await
    }

    /// Every item for `creative_instance_id`, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to run the query.
    pub async fn get_for_creative_instance_id(
        &self,
        creative_instance_id: &str,
    ) -> Result<AdHistoryList> {
        let sql = format!(
            "SELECT {} FROM {AD_HISTORY_TABLE} WHERE creative_instance_id = ?;",
            codec::column_names()
        );

        self.select(
            sql,
            vec![BindValue::String(creative_instance_id.to_string())],
        )
        .await
    }

    /// Delete items at or beyond the configured retention period.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to run the delete.
    pub async fn purge_expired(&self) -> Result<()> {
        self.purge_expired_at(timestamp::now()).await
    }

    /// Delete items created at or before `now - retention_period`.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the retention period reaches beyond the
    /// representable range, or an error if the engine fails to run the
    /// delete.
    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> Result<()> {
        let cutoff = self.config.get().retention_cutoff(now)?;

        let mut transaction = Transaction::new();
        transaction.push(Statement::run(
            format!("DELETE FROM {AD_HISTORY_TABLE} WHERE created_at <= ?;"),
            vec![BindValue::Int64(to_platform_timestamp(cutoff))],
        ));

        self.db.run_transaction(transaction).await?;
        info!(cutoff = %cutoff.to_rfc3339(), "Purged expired ad history");
        Ok(())
    }

    async fn select(&self, sql: String, bind_values: Vec<BindValue>) -> Result<AdHistoryList> {
        let mut transaction = Transaction::new();
        transaction.push(Statement::step(sql, bind_values, codec::column_types()));

        let result = self.db.run_transaction(transaction).await?;
        let items = codec::decode_rows(&result.rows);
        debug!(rows = result.rows.len(), items = items.len(), "Read ad history");
        Ok(items)
    }
}

impl<D: Database> TableInterface for AdHistoryTable<D> {
    fn table_name(&self) -> &'static str {
        AD_HISTORY_TABLE
    }

    fn create(&self, transaction: &mut Transaction) {
        execute(transaction, AD_HISTORY_TABLE_SQL);
        for column in INDEXED_COLUMNS {
            create_table_index(transaction, AD_HISTORY_TABLE, &[column]);
        }
    }

    fn migrate(&self, transaction: &mut Transaction, to_version: u32) {
        match to_version {
            1 => migrate_to_v1(transaction),
            2 => migrate_to_v2(transaction),
            _ => {}
        }
    }
}

/// Append one insert statement for the valid items in `batch`.
fn insert(transaction: &mut Transaction, batch: &[AdHistoryItem]) {
    let (bind_values, row_count) = codec::bind_columns(batch);
    if row_count == 0 {
        return;
    }

    transaction.push(Statement::run(
        format!(
            "INSERT INTO {AD_HISTORY_TABLE} ({}) VALUES {};",
            codec::column_names(),
            build_bind_column_placeholders(COLUMN_COUNT, row_count)
        ),
        bind_values,
    ));
}

fn migrate_to_v1(transaction: &mut Transaction) {
    execute(transaction, AD_HISTORY_TABLE_SQL);
    create_table_index(transaction, AD_HISTORY_TABLE, &["created_at"]);
    create_table_index(transaction, AD_HISTORY_TABLE, &["confirmation_type"]);
    create_table_index(transaction, AD_HISTORY_TABLE, &["placement_id"]);
}

fn migrate_to_v2(transaction: &mut Transaction) {
    create_table_index(transaction, AD_HISTORY_TABLE, &["creative_instance_id"]);
}

fn date_range_bind_values(from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<BindValue> {
    vec![
        BindValue::Int64(to_platform_timestamp(from)),
        BindValue::Int64(to_platform_timestamp(to)),
    ]
}

/// `CASE confirmation_type WHEN 'click' THEN 1 ... ELSE 0 END`
fn placement_rank_case_expression() -> String {
    let arms: String = PLACEMENT_RANKS
        .iter()
        .map(|(confirmation_type, rank)| {
            format!(" WHEN '{}' THEN {rank}", confirmation_type.as_str())
        })
        .collect();
    format!("CASE confirmation_type{arms} ELSE 0 END")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdHistoryConfig;
    use crate::error::Error;
    use crate::model::{AdType, ConfirmationType, parse_target_url};
    use crate::storage::database::{OperationType, TransactionResult};
    use crate::storage::migrations::initialize;
    use crate::storage::schema::SchemaVersion;
    use crate::storage::sqlite::SqliteDatabase;
    use chrono::Duration;
    use std::sync::{Arc, Mutex};

    /// Engine double that records transactions and optionally fails them.
    #[derive(Clone, Default)]
    struct RecordingDatabase {
        transactions: Arc<Mutex<Vec<Transaction>>>,
        fail: bool,
    }

    impl RecordingDatabase {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn transactions(&self) -> Vec<Transaction> {
            self.transactions.lock().unwrap().clone()
        }
    }

    impl Database for RecordingDatabase {
        fn run_transaction(
            &self,
            transaction: Transaction,
        ) -> impl std::future::Future<Output = Result<TransactionResult>> + Send {
            self.transactions.lock().unwrap().push(transaction);
            let fail = self.fail;
            async move {
                if fail {
                    Err(Error::TransactionFailed("injected failure".to_string()))
                } else {
                    Ok(TransactionResult::default())
                }
            }
        }
    }

    fn item_at(
        created_at: DateTime<Utc>,
        placement_id: &str,
        confirmation_type: ConfirmationType,
    ) -> AdHistoryItem {
        AdHistoryItem {
            created_at,
            ad_type: AdType::NotificationAd,
            confirmation_type,
            placement_id: placement_id.to_string(),
            creative_instance_id: format!("creative-instance-{placement_id}"),
            creative_set_id: "creative-set".to_string(),
            campaign_id: "campaign".to_string(),
            advertiser_id: "advertiser".to_string(),
            segment: "untargeted".to_string(),
            title: "Title".to_string(),
            description: "Description".to_string(),
            target_url: parse_target_url("https://brave.com/"),
        }
    }

    fn items(count: usize) -> Vec<AdHistoryItem> {
        let now = timestamp::now();
        (0..count)
            .map(|i| {
                item_at(
                    now - Duration::seconds(i64::try_from(i).unwrap()),
                    &format!("placement-{i}"),
                    ConfirmationType::ViewedImpression,
                )
            })
            .collect()
    }

    async fn open_table() -> AdHistoryTable<SqliteDatabase> {
        let db = SqliteDatabase::open_memory().unwrap();
        let table = AdHistoryTable::new(db.clone(), ConfigHandle::default());
        let version = initialize(&db, &[&table]).await.unwrap();
        assert_eq!(version, SchemaVersion::CURRENT);
        table
    }

    fn distant_past() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }

    #[tokio::test]
    async fn test_save_batches_into_one_transaction() {
        let db = RecordingDatabase::default();
        let table = AdHistoryTable::new(db.clone(), ConfigHandle::default());

        table.save(&items(120)).await.unwrap();

        let transactions = db.transactions();
        assert_eq!(transactions.len(), 1);

        let statements = &transactions[0].statements;
        let rows: Vec<usize> = statements
            .iter()
            .map(|s| s.bind_values.len() / COLUMN_COUNT)
            .collect();
        assert_eq!(rows, vec![50, 50, 20]);
        for statement in statements {
            assert_eq!(statement.operation, OperationType::Run);
            assert_eq!(statement.sql.matches('?').count(), statement.bind_values.len());
        }
    }

    #[tokio::test]
    async fn test_save_uses_configured_batch_size() {
        let db = RecordingDatabase::default();
        let config = ConfigHandle::new(AdHistoryConfig {
            batch_size: 2,
            ..AdHistoryConfig::default()
        });
        let table = AdHistoryTable::new(db.clone(), config);

        table.save(&items(5)).await.unwrap();

        assert_eq!(db.transactions()[0].len(), 3);
    }

    #[tokio::test]
    async fn test_oversized_batch_size_stays_within_parameter_limit() {
        let config = ConfigHandle::new(AdHistoryConfig {
            batch_size: 5_000,
            ..AdHistoryConfig::default()
        });
        let db = SqliteDatabase::open_memory().unwrap();
        let table = AdHistoryTable::new(db.clone(), config);
        initialize(&db, &[&table]).await.unwrap();

        table.save(&items(3_000)).await.unwrap();

        let history = table
            .get_for_date_range(distant_past(), timestamp::now())
            .await
            .unwrap();
        assert_eq!(history.len(), 3_000);
    }

    #[tokio::test]
    async fn test_save_failure_is_reported() {
        let db = RecordingDatabase::failing();
        let table = AdHistoryTable::new(db.clone(), ConfigHandle::default());

        let result = table.save(&items(120)).await;
        assert!(matches!(result, Err(Error::TransactionFailed(_))));
    }

    #[tokio::test]
    async fn test_save_empty_issues_no_statements() {
        let db = RecordingDatabase::default();
        let table = AdHistoryTable::new(db.clone(), ConfigHandle::default());

        table.save(&[]).await.unwrap();
        assert!(db.transactions().is_empty());

        // All-invalid input is just as empty
        let mut invalid = items(1);
        invalid[0].placement_id.clear();
        table.save(&invalid).await.unwrap();
        assert!(db.transactions().is_empty());
    }

    #[tokio::test]
    async fn test_save_skips_invalid_before_counting_rows() {
        let db = RecordingDatabase::default();
        let table = AdHistoryTable::new(db.clone(), ConfigHandle::default());

        let mut batch = items(3);
        batch[1].target_url = None;
        table.save(&batch).await.unwrap();

        let statement = &db.transactions()[0].statements[0];
        assert_eq!(statement.bind_values.len(), 2 * COLUMN_COUNT);
        assert_eq!(statement.sql.matches('?').count(), 2 * COLUMN_COUNT);
    }

    #[tokio::test]
    async fn test_get_failure_is_no_result() {
        let db = RecordingDatabase::failing();
        let table = AdHistoryTable::new(db, ConfigHandle::default());

        let now = timestamp::now();
        assert!(table.get_for_date_range(distant_past(), now).await.is_err());
        assert!(
            table
                .get_highest_ranked_placements_for_date_range(distant_past(), now)
                .await
                .is_err()
        );
        assert!(table.get_for_creative_instance_id("x").await.is_err());
        assert!(table.purge_expired().await.is_err());
    }

    #[tokio::test]
    async fn test_save_then_get_returns_newest_first() {
        let table = open_table().await;
        let now = timestamp::now();

        let oldest = item_at(now - Duration::hours(2), "a", ConfirmationType::ViewedImpression);
        let middle = item_at(now - Duration::hours(1), "b", ConfirmationType::Clicked);
        let newest = item_at(now, "c", ConfirmationType::Dismissed);
        table
            .save(&[middle.clone(), newest.clone(), oldest.clone()])
            .await
            .unwrap();

        let history = table.get_for_date_range(distant_past(), now).await.unwrap();
        assert_eq!(history, vec![newest, middle, oldest]);
    }

    #[tokio::test]
    async fn test_date_range_is_inclusive() {
        let table = open_table().await;
        let now = timestamp::now();
        let from = now - Duration::hours(1);

        table
            .save(&[
                item_at(from, "from", ConfirmationType::ViewedImpression),
                item_at(now, "to", ConfirmationType::ViewedImpression),
                item_at(
                    from - Duration::microseconds(1),
                    "before",
                    ConfirmationType::ViewedImpression,
                ),
                item_at(
                    now + Duration::microseconds(1),
                    "after",
                    ConfirmationType::ViewedImpression,
                ),
            ])
            .await
            .unwrap();

        let placements: Vec<String> = table
            .get_for_date_range(from, now)
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.placement_id)
            .collect();
        assert_eq!(placements, vec!["to", "from"]);
    }

    #[tokio::test]
    async fn test_many_items_round_trip() {
        let table = open_table().await;
        let saved = items(120);
        table.save(&saved).await.unwrap();

        let history = table
            .get_for_date_range(distant_past(), timestamp::now())
            .await
            .unwrap();
        // items() already produces newest first
        assert_eq!(history, saved);
    }

    #[tokio::test]
    async fn test_highest_ranked_placement_wins() {
        let table = open_table().await;
        let now = timestamp::now();

        let served = item_at(now - Duration::minutes(4), "p1", ConfirmationType::ServedImpression);
        let viewed = item_at(now - Duration::minutes(3), "p1", ConfirmationType::ViewedImpression);
        let clicked = item_at(now - Duration::minutes(2), "p1", ConfirmationType::Clicked);
        let dismissed = item_at(now - Duration::minutes(1), "p2", ConfirmationType::Dismissed);
        let viewed_p2 = item_at(
            now - Duration::minutes(5),
            "p2",
            ConfirmationType::ViewedImpression,
        );
        let served_only = item_at(now, "p3", ConfirmationType::ServedImpression);
        let landed_only = item_at(now, "p4", ConfirmationType::Landed);

        table
            .save(&[
                served,
                viewed,
                clicked.clone(),
                dismissed.clone(),
                viewed_p2,
                served_only,
                landed_only,
            ])
            .await
            .unwrap();

        let winners = table
            .get_highest_ranked_placements_for_date_range(distant_past(), now)
            .await
            .unwrap();
        assert_eq!(winners, vec![dismissed, clicked]);
    }

    #[tokio::test]
    async fn test_highest_ranked_respects_date_range() {
        let table = open_table().await;
        let now = timestamp::now();

        // The click is outside the range, so the view wins
        let clicked = item_at(now - Duration::days(2), "p1", ConfirmationType::Clicked);
        let viewed = item_at(now, "p1", ConfirmationType::ViewedImpression);
        table.save(&[clicked, viewed.clone()]).await.unwrap();

        let winners = table
            .get_highest_ranked_placements_for_date_range(now - Duration::days(1), now)
            .await
            .unwrap();
        assert_eq!(winners, vec![viewed]);
    }

    #[tokio::test]
    async fn test_get_for_creative_instance_id() {
        let table = open_table().await;
        let now = timestamp::now();

        let first = item_at(now, "p1", ConfirmationType::ViewedImpression);
        let mut second = item_at(now, "p2", ConfirmationType::Clicked);
        second.creative_instance_id = first.creative_instance_id.clone();
        let other = item_at(now, "p3", ConfirmationType::ViewedImpression);
        table
            .save(&[first.clone(), second.clone(), other])
            .await
            .unwrap();

        let mut found = table
            .get_for_creative_instance_id(&first.creative_instance_id)
            .await
            .unwrap();
        found.sort_by(|a, b| a.placement_id.cmp(&b.placement_id));
        assert_eq!(found, vec![first, second]);

        assert!(
            table
                .get_for_creative_instance_id("unknown")
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_purge_expired_boundary() {
        let table = open_table().await;
        let now = timestamp::now();
        let retention = AdHistoryConfig::default().retention_period();

        let expired = item_at(
            now - retention - Duration::seconds(1),
            "expired",
            ConfirmationType::ViewedImpression,
        );
        let at_cutoff = item_at(
            now - retention,
            "at_cutoff",
            ConfirmationType::ViewedImpression,
        );
        let retained = item_at(
            now - retention + Duration::seconds(1),
            "retained",
            ConfirmationType::ViewedImpression,
        );
        table
            .save(&[expired, at_cutoff, retained.clone()])
            .await
            .unwrap();

        table.purge_expired_at(now).await.unwrap();

        let history = table.get_for_date_range(distant_past(), now).await.unwrap();
        assert_eq!(history, vec![retained]);
    }

    #[tokio::test]
    async fn test_purge_with_unrepresentable_retention_fails() {
        let db = RecordingDatabase::default();
        let config = ConfigHandle::new(AdHistoryConfig {
            retention_period_days: 200_000_000,
            ..AdHistoryConfig::default()
        });
        let table = AdHistoryTable::new(db.clone(), config);

        let result = table.purge_expired().await;
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(db.transactions().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_items_never_surface() {
        let table = open_table().await;
        let now = timestamp::now();

        let valid = item_at(now, "valid", ConfirmationType::Clicked);
        let mut invalid = item_at(now, "", ConfirmationType::Clicked);
        invalid.creative_instance_id = valid.creative_instance_id.clone();
        table.save(&[valid.clone(), invalid]).await.unwrap();

        // Rows written behind the store's back
        let mut transaction = Transaction::new();
        transaction.push(Statement::run(
            format!(
                "INSERT INTO ad_history ({}) VALUES {};",
                codec::column_names(),
                build_bind_column_placeholders(COLUMN_COUNT, 2)
            ),
            [
                item_at(now, "", ConfirmationType::Clicked),
                item_at(now, "bogus-type", ConfirmationType::Clicked),
            ]
            .iter()
            .enumerate()
            .flat_map(|(i, item)| {
                let mut values = codec::encode(item);
                values[4] = BindValue::String(valid.creative_instance_id.clone());
                if i == 1 {
                    values[1] = BindValue::String("billboard".to_string());
                }
                values
            })
            .collect(),
        ));
        table.db.run_transaction(transaction).await.unwrap();

        assert_eq!(
            table.get_for_date_range(distant_past(), now).await.unwrap(),
            vec![valid.clone()]
        );
        assert_eq!(
            table
                .get_highest_ranked_placements_for_date_range(distant_past(), now)
                .await
                .unwrap(),
            vec![valid.clone()]
        );
        assert_eq!(
            table
                .get_for_creative_instance_id(&valid.creative_instance_id)
                .await
                .unwrap(),
            vec![valid]
        );
    }

    #[test]
    fn test_unknown_migration_is_noop() {
        let table = AdHistoryTable::new(RecordingDatabase::default(), ConfigHandle::default());
        let mut transaction = Transaction::new();
        table.migrate(&mut transaction, 99);
        table.migrate(&mut transaction, 0);
        assert!(transaction.is_empty());
    }

    #[test]
    fn test_create_matches_migrations() {
        let table = AdHistoryTable::new(RecordingDatabase::default(), ConfigHandle::default());

        let mut created = Transaction::new();
        table.create(&mut created);

        let mut migrated = Transaction::new();
        table.migrate(&mut migrated, 1);
        table.migrate(&mut migrated, 2);

        let mut created_sql: Vec<_> = created.statements.iter().map(|s| s.sql.clone()).collect();
        let mut migrated_sql: Vec<_> = migrated.statements.iter().map(|s| s.sql.clone()).collect();
        created_sql.sort();
        migrated_sql.sort();
        assert_eq!(created_sql, migrated_sql);
    }

    #[test]
    fn test_placement_rank_case_expression() {
        assert_eq!(
            placement_rank_case_expression(),
            concat!(
                "CASE confirmation_type WHEN 'click' THEN 1 WHEN 'dismiss' THEN 2",
                " WHEN 'view' THEN 3 ELSE 0 END"
            )
        );
    }
}
