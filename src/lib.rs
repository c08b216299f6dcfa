//! Ad history CLI - a local store of ad events
//!
//! This crate provides the core functionality for the `adh` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Data types (AdHistoryItem, AdType, ConfirmationType)
//! - [`storage`] - Transactional engine contract, SQLite engine and the ad history table
//! - [`serving`] - Priority bucketing for eligible creative ads
//! - [`notifier`] - Ads client event fan-out
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod notifier;
pub mod serving;
pub mod storage;
pub mod timestamp;
pub mod validate;

pub use error::{Error, Result};
