//! Column encoding for ad history rows.
//!
//! [`COLUMNS`] fixes the column order used by the table DDL, the insert and
//! select statements, and [`encode`]/[`decode`]. Timestamps are stored as
//! platform microseconds, enums as their canonical lowercase names.

use crate::model::{AdHistoryItem, AdType, ConfirmationType, parse_target_url};
use crate::storage::database::{BindValue, ColumnType, Row};
use crate::timestamp::{from_platform_timestamp, to_platform_timestamp};
use tracing::warn;

/// Persisted columns, in bind/select order.
pub const COLUMNS: [(&str, ColumnType); 12] = [
    ("created_at", ColumnType::Int64),
    ("ad_type", ColumnType::String),
    ("confirmation_type", ColumnType::String),
    ("placement_id", ColumnType::String),
    ("creative_instance_id", ColumnType::String),
    ("creative_set_id", ColumnType::String),
    ("campaign_id", ColumnType::String),
    ("advertiser_id", ColumnType::String),
    ("segment", ColumnType::String),
    ("title", ColumnType::String),
    ("description", ColumnType::String),
    ("target_url", ColumnType::String),
];

pub const COLUMN_COUNT: usize = COLUMNS.len();

/// Comma separated column list for `INSERT`/`SELECT` statements.
#[must_use]
pub fn column_names() -> String {
    COLUMNS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Declared result column types for `Step` statements.
#[must_use]
pub fn column_types() -> Vec<ColumnType> {
    COLUMNS.iter().map(|(_, column_type)| *column_type).collect()
}

/// Encode one item into bind values, in column order.
#[must_use]
pub fn encode(item: &AdHistoryItem) -> Vec<BindValue> {
    vec![
        BindValue::Int64(to_platform_timestamp(item.created_at)),
        BindValue::String(item.ad_type.as_str().to_string()),
        BindValue::String(item.confirmation_type.as_str().to_string()),
        BindValue::String(item.placement_id.clone()),
        BindValue::String(item.creative_instance_id.clone()),
        BindValue::String(item.creative_set_id.clone()),
        BindValue::String(item.campaign_id.clone()),
        BindValue::String(item.advertiser_id.clone()),
        BindValue::String(item.segment.clone()),
        BindValue::String(item.title.clone()),
        BindValue::String(item.description.clone()),
        BindValue::String(item.target_url_str().to_string()),
    ]
}

/// Decode a row selected with [`column_names`].
///
/// Never fails: missing or mistyped columns decode to empty/undefined values,
/// which leaves an item that does not pass [`AdHistoryItem::is_valid`].
#[must_use]
pub fn decode(row: &Row) -> AdHistoryItem {
    AdHistoryItem {
        created_at: from_platform_timestamp(row.column_int64(0)),
        ad_type: AdType::from_str(&row.column_string(1)),
        confirmation_type: ConfirmationType::from_str(&row.column_string(2)),
        placement_id: row.column_string(3),
        creative_instance_id: row.column_string(4),
        creative_set_id: row.column_string(5),
        campaign_id: row.column_string(6),
        advertiser_id: row.column_string(7),
        segment: row.column_string(8),
        title: row.column_string(9),
        description: row.column_string(10),
        target_url: parse_target_url(&row.column_string(11)),
    }
}

/// Encode every valid item, skipping invalid ones.
///
/// Returns the bind values and the number of rows they cover.
#[must_use]
pub fn bind_columns(items: &[AdHistoryItem]) -> (Vec<BindValue>, usize) {
    let mut bind_values = Vec::with_capacity(items.len() * COLUMN_COUNT);
    let mut row_count = 0;

    for item in items {
        if !item.is_valid() {
            warn!(
                placement_id = %item.placement_id,
                creative_instance_id = %item.creative_instance_id,
                "Invalid ad history item, not saving"
            );
            continue;
        }

        bind_values.extend(encode(item));
        row_count += 1;
    }

    (bind_values, row_count)
}

/// Decode rows, dropping any that do not form a valid item.
#[must_use]
pub fn decode_rows(rows: &[Row]) -> Vec<AdHistoryItem> {
    rows.iter()
        .map(decode)
        .filter(|item| {
            let valid = item.is_valid();
            if !valid {
                warn!(
                    placement_id = %item.placement_id,
                    creative_instance_id = %item.creative_instance_id,
                    "Invalid ad history item, skipping row"
                );
            }
            valid
        })
        .collect()
}
