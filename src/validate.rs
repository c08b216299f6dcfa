//! Input normalization for the operator CLI.
//!
//! Ad and confirmation types are accepted by canonical name, by a common
//! synonym, or case-insensitively. Three-tier resolution: exact match →
//! synonym lookup → error with the closest suggestion.

use crate::model::{AdType, ConfirmationType};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

// ── Valid value sets (O(1) lookups) ──────────────────────────

pub static VALID_AD_TYPES: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| AdType::ALL.iter().map(AdType::as_str).collect());

pub static VALID_CONFIRMATION_TYPES: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ConfirmationType::ALL.iter().map(ConfirmationType::as_str).collect());

// ── Synonym maps ─────────────────────────────────────────────

pub static AD_TYPE_SYNONYMS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        [
            ("notification", "ad_notification"),
            ("notification_ad", "ad_notification"),
            ("push", "ad_notification"),
            ("ntp", "new_tab_page_ad"),
            ("new_tab_page", "new_tab_page_ad"),
            ("new_tab", "new_tab_page_ad"),
            ("promoted", "promoted_content_ad"),
            ("promoted_content", "promoted_content_ad"),
            ("inline", "inline_content_ad"),
            ("inline_content", "inline_content_ad"),
            ("search", "search_result_ad"),
            ("search_result", "search_result_ad"),
        ]
        .into_iter()
        .collect()
    });

pub static CONFIRMATION_TYPE_SYNONYMS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        [
            ("clicked", "click"),
            ("dismissed", "dismiss"),
            ("viewed", "view"),
            ("impression", "view"),
            ("serve", "served"),
            ("land", "landed"),
            ("inappropriate", "flag"),
            ("flagged", "flag"),
            ("save", "bookmark"),
            ("saved", "bookmark"),
            ("like", "upvote"),
            ("liked", "upvote"),
            ("dislike", "downvote"),
            ("disliked", "downvote"),
            ("converted", "conversion"),
            ("play", "media_play"),
        ]
        .into_iter()
        .collect()
    });

/// Normalize an ad type via exact match or synonym lookup.
///
/// Returns the ad type, or an error with the original input and an optional
/// suggestion.
pub fn normalize_ad_type(input: &str) -> Result<AdType, (String, Option<String>)> {
    normalize(input, &VALID_AD_TYPES, &AD_TYPE_SYNONYMS).map(|name| AdType::from_str(&name))
}

/// Normalize a confirmation type via exact match or synonym lookup.
pub fn normalize_confirmation_type(
    input: &str,
) -> Result<ConfirmationType, (String, Option<String>)> {
    normalize(input, &VALID_CONFIRMATION_TYPES, &CONFIRMATION_TYPE_SYNONYMS)
        .map(|name| ConfirmationType::from_str(&name))
}

fn normalize(
    input: &str,
    valid: &HashSet<&'static str>,
    synonyms: &HashMap<&'static str, &'static str>,
) -> Result<String, (String, Option<String>)> {
    let lower = input.trim().to_lowercase().replace('-', "_");

    // Tier 1: exact match
    if valid.contains(lower.as_str()) {
        return Ok(lower);
    }

    // Tier 2: synonym lookup
    if let Some(&canonical) = synonyms.get(lower.as_str()) {
        return Ok(canonical.to_string());
    }

    // Tier 3: find closest suggestion
    let suggestion = find_closest_match(&lower, valid, synonyms);
    Err((input.to_string(), suggestion))
}

/// Find the closest matching value across valid set and synonyms.
fn find_closest_match(
    input: &str,
    valid: &HashSet<&str>,
    synonyms: &HashMap<&str, &str>,
) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;

    for &candidate in valid.iter().chain(synonyms.keys()) {
        let dist = levenshtein_distance(input, candidate);
        if dist <= 3 && best.is_none_or(|(_, best_dist)| dist < best_dist) {
            // For synonyms, suggest what it maps to
            let canonical = synonyms.get(candidate).copied().unwrap_or(candidate);
            best = Some((canonical, dist));
        }
    }

    best.map(|(v, _)| v.to_string())
}

// ── Levenshtein distance ─────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
#[must_use]
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Single-row optimization
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1) // deletion
                .min(curr[j - 1] + 1) // insertion
                .min(prev[j - 1] + cost); // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
