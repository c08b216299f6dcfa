//! Data models for the ad history store.
//!
//! - AdHistoryItem (one recorded ad event)
//! - AdType
//! - ConfirmationType

pub mod ad_history;
pub mod ad_type;
pub mod confirmation_type;

pub use ad_history::{AdHistoryItem, AdHistoryList, parse_target_url};
pub use ad_type::AdType;
pub use confirmation_type::{ConfirmationType, PLACEMENT_RANKS};
