//! Show ad history for a date range.

use crate::cli::HistoryArgs;
use crate::error::{Error, Result};
use crate::timestamp;
use chrono::{DateTime, Duration, Utc};
use std::path::Path;

use super::{load_config_handle, open_database, print_history, runtime};

/// Execute the history command.
///
/// With `--top`, only the highest ranked event per placement is shown.
///
/// # Errors
///
/// Returns `InvalidArgument` for an empty range, or an error if the
/// database cannot be opened or queried.
pub fn execute(
    args: &HistoryArgs,
    db_path: Option<&Path>,
    config_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = load_config_handle(config_path)?;
    let (from, to) = resolve_range(args, config.get().retention_period_days, timestamp::now())?;

    let rt = runtime()?;
    let items = rt.block_on(async {
        let ads = open_database(db_path, config).await?;
        if args.top {
            ads.ad_history()
                .get_highest_ranked_placements_for_date_range(from, to)
                .await
        } else {
            ads.ad_history().get_for_date_range(from, to).await
        }
    })?;

    print_history(&items, json)
}

/// Resolve the query range.
///
/// `to` defaults to `now`; `from` defaults to `--days` (or the retention
/// period) before `to`.
fn resolve_range(
    args: &HistoryArgs,
    retention_period_days: u32,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let to = args.to.unwrap_or(now);
    let from = match args.from {
        Some(from) => from,
        None => {
            let days = args.days.unwrap_or(retention_period_days);
            to.checked_sub_signed(Duration::days(i64::from(days)))
                .ok_or_else(|| {
                    Error::InvalidArgument(format!(
                        "--days {days} reaches beyond the earliest date"
                    ))
                })?
        }
    };

    if from > to {
        return Err(Error::InvalidArgument(format!(
            "Range start {} is after range end {}",
            from.to_rfc3339(),
            to.to_rfc3339()
        )));
    }

    Ok((from, to))
}
