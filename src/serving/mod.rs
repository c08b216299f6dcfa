//! Ad serving helpers that operate on in-memory candidate sets.
//!
//! - [`priority`] - Priority bucketing for eligible creative ads

pub mod priority;

pub use priority::{CreativeAd, Prioritized, highest_priority, sort_into_buckets_by_priority};
