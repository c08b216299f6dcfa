//! Platform timestamp conversions.
//!
//! Timestamps are persisted as signed microseconds since
//! 1601-01-01T00:00:00Z (the Windows/Chrome epoch), so values written by
//! other platform components sort and compare the same way.

use chrono::{DateTime, SubsecRound, Utc};

/// Microseconds between 1601-01-01 and 1970-01-01.
pub const PLATFORM_EPOCH_DELTA_MICROS: i64 = 11_644_473_600_000_000;

/// Current time truncated to microsecond precision.
///
/// Anything finer is lost on the way through the store, so records built
/// from this value decode back to exactly the same instant.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Convert a UTC time to platform microseconds.
#[must_use]
pub fn to_platform_timestamp(time: DateTime<Utc>) -> i64 {
    time.timestamp_micros()
        .saturating_add(PLATFORM_EPOCH_DELTA_MICROS)
}

/// Convert platform microseconds back to a UTC time.
///
/// Values outside chrono's representable range clamp to the Unix epoch.
#[must_use]
pub fn from_platform_timestamp(value: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(value.saturating_sub(PLATFORM_EPOCH_DELTA_MICROS))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
