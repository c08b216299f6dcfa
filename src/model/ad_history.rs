//! Ad history model.
//!
//! An ad history item is one observed lifecycle event for a placement
//! (served, viewed, clicked, dismissed, ...). Items are immutable once
//! stored; corrections are recorded as new events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use super::{AdType, ConfirmationType};

/// A single ad event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdHistoryItem {
    /// When the event happened (microsecond precision once stored)
    pub created_at: DateTime<Utc>,

    /// Placement kind
    #[serde(rename = "type")]
    pub ad_type: AdType,

    /// Interaction recorded for the placement
    pub confirmation_type: ConfirmationType,

    /// Groups all events that belong to one shown placement
    pub placement_id: String,

    pub creative_instance_id: String,
    pub creative_set_id: String,
    pub campaign_id: String,
    pub advertiser_id: String,

    /// Taxonomy segment, e.g. "technology & computing"
    #[serde(default)]
    pub segment: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Landing page. `None` when the stored or supplied value did not parse.
    #[serde(default, deserialize_with = "deserialize_lenient_url")]
    pub target_url: Option<Url>,
}

/// Ordered list of ad history items.
pub type AdHistoryList = Vec<AdHistoryItem>;

impl AdHistoryItem {
    /// Whether this item may be persisted or returned from a read.
    ///
    /// Both enums must be defined, every identifier must be non-empty and the
    /// target URL must be an absolute URL with a host.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.ad_type.is_defined()
            && self.confirmation_type.is_defined()
            && !self.placement_id.is_empty()
            && !self.creative_instance_id.is_empty()
            && !self.creative_set_id.is_empty()
            && !self.campaign_id.is_empty()
            && !self.advertiser_id.is_empty()
            && self
                .target_url
                .as_ref()
                .is_some_and(|url| url.has_host())
    }

    /// Target URL as stored, or an empty string when missing.
    #[must_use]
    pub fn target_url_str(&self) -> &str {
        self.target_url.as_ref().map_or("", Url::as_str)
    }
}

/// Parse a URL string, mapping unparseable input to `None` instead of failing
/// the whole document.
#[must_use]
pub fn parse_target_url(value: &str) -> Option<Url> {
    Url::parse(value).ok()
}

fn deserialize_lenient_url<'de, D>(deserializer: D) -> Result<Option<Url>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.as_deref().and_then(parse_target_url))
}
