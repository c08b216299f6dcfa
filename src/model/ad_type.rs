//! Ad type model.

use serde::{Deserialize, Serialize};

/// Kind of placement an ad event belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AdType {
    #[default]
    Undefined,
    NotificationAd,
    NewTabPageAd,
    PromotedContentAd,
    InlineContentAd,
    SearchResultAd,
}

impl AdType {
    /// Every defined ad type, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::NotificationAd,
        Self::NewTabPageAd,
        Self::PromotedContentAd,
        Self::InlineContentAd,
        Self::SearchResultAd,
    ];

    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::NotificationAd => "ad_notification",
            Self::NewTabPageAd => "new_tab_page_ad",
            Self::PromotedContentAd => "promoted_content_ad",
            Self::InlineContentAd => "inline_content_ad",
            Self::SearchResultAd => "search_result_ad",
        }
    }

    /// Parse a stored name. Unknown names map to `Undefined`.
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|ad_type| ad_type.as_str() == s)
            .unwrap_or(Self::Undefined)
    }

    #[must_use]
    pub const fn is_defined(&self) -> bool {
        !matches!(self, Self::Undefined)
    }
}

impl std::fmt::Display for AdType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for AdType {
    fn from(value: String) -> Self {
        Self::from_str(&value)
    }
}

impl From<AdType> for String {
    fn from(value: AdType) -> Self {
        value.as_str().to_string()
    }
}
