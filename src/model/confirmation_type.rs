//! Confirmation type model.
//!
//! A confirmation type is the kind of user or system interaction recorded
//! against a placement. Three of them also carry a placement rank, used to
//! pick one winning event per placement.

use serde::{Deserialize, Serialize};

/// Kind of interaction recorded for a placement event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConfirmationType {
    #[default]
    Undefined,
    Clicked,
    Dismissed,
    ViewedImpression,
    ServedImpression,
    Landed,
    MarkAdAsInappropriate,
    SavedAd,
    LikedAd,
    DislikedAd,
    Conversion,
    MediaPlay,
    Media25,
    Media100,
}

/// Rank of each winning confirmation type; lower wins.
///
/// Anything absent from this table has rank 0 and never wins a placement.
pub const PLACEMENT_RANKS: [(ConfirmationType, u32); 3] = [
    (ConfirmationType::Clicked, 1),
    (ConfirmationType::Dismissed, 2),
    (ConfirmationType::ViewedImpression, 3),
];

impl ConfirmationType {
    /// Every defined confirmation type, in declaration order.
    pub const ALL: [Self; 13] = [
        Self::Clicked,
        Self::Dismissed,
        Self::ViewedImpression,
        Self::ServedImpression,
        Self::Landed,
        Self::MarkAdAsInappropriate,
        Self::SavedAd,
        Self::LikedAd,
        Self::DislikedAd,
        Self::Conversion,
        Self::MediaPlay,
        Self::Media25,
        Self::Media100,
    ];

    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Clicked => "click",
            Self::Dismissed => "dismiss",
            Self::ViewedImpression => "view",
            Self::ServedImpression => "served",
            Self::Landed => "landed",
            Self::MarkAdAsInappropriate => "flag",
            Self::SavedAd => "bookmark",
            Self::LikedAd => "upvote",
            Self::DislikedAd => "downvote",
            Self::Conversion => "conversion",
            Self::MediaPlay => "media_play",
            Self::Media25 => "media_25",
            Self::Media100 => "media_100",
        }
    }

    /// Parse a stored name. Unknown names map to `Undefined`.
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|confirmation_type| confirmation_type.as_str() == s)
            .unwrap_or(Self::Undefined)
    }

    #[must_use]
    pub const fn is_defined(&self) -> bool {
        !matches!(self, Self::Undefined)
    }

    /// Placement rank of this confirmation type (0 = never wins).
    #[must_use]
    pub fn placement_rank(&self) -> u32 {
        PLACEMENT_RANKS
            .iter()
            .find(|(confirmation_type, _)| confirmation_type == self)
            .map_or(0, |&(_, rank)| rank)
    }
}

impl std::fmt::Display for ConfirmationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ConfirmationType {
    fn from(value: String) -> Self {
        Self::from_str(&value)
    }
}

impl From<ConfirmationType> for String {
    fn from(value: ConfirmationType) -> Self {
        value.as_str().to_string()
    }
}
