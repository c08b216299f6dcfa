//! Priority bucketing.
//!
//! Candidates carry a priority where 1 is the highest, larger numbers are
//! lower, and 0 means never eligible. This is the same convention as the
//! placement rank used by the ad history best-of-group query.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Segment name of creative ads that are not targeted at any segment.
pub const UNTARGETED_SEGMENT: &str = "untargeted";

/// A candidate with a priority.
pub trait Prioritized {
    fn priority(&self) -> u32;

    /// Whether the candidate is targeted at a segment. Only used for logging.
    fn is_targeted(&self) -> bool {
        true
    }
}

/// Minimal creative ad candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreativeAd {
    pub creative_instance_id: String,
    pub segment: String,
    pub priority: u32,
}

impl Prioritized for CreativeAd {
    fn priority(&self) -> u32 {
        self.priority
    }

    fn is_targeted(&self) -> bool {
        self.segment != UNTARGETED_SEGMENT
    }
}

/// Group candidates by priority, lowest number first.
///
/// Candidates with priority 0 are left out. Input order is preserved within
/// each bucket.
#[must_use]
pub fn sort_into_buckets_by_priority<T: Prioritized + Clone>(
    candidates: &[T],
) -> BTreeMap<u32, Vec<T>> {
    let mut buckets: BTreeMap<u32, Vec<T>> = BTreeMap::new();

    for candidate in candidates {
        let priority = candidate.priority();
        if priority == 0 {
            continue;
        }
        buckets.entry(priority).or_default().push(candidate.clone());
    }

    buckets
}

/// Candidates in the highest priority bucket, or none if no candidate has a
/// positive priority.
#[must_use]
pub fn highest_priority<T: Prioritized + Clone>(candidates: &[T]) -> Vec<T> {
    let buckets = sort_into_buckets_by_priority(candidates);
    log_candidates_per_bucket(&buckets);

    buckets.into_values().next().unwrap_or_default()
}

fn log_candidates_per_bucket<T: Prioritized>(buckets: &BTreeMap<u32, Vec<T>>) {
    for (bucket, (priority, candidates)) in buckets.iter().enumerate() {
        let targeted = candidates.iter().filter(|c| c.is_targeted()).count();
        debug!(
            bucket = bucket + 1,
            priority,
            targeted,
            untargeted = candidates.len() - targeted,
            "Creative ads in priority bucket"
        );
    }
}
