//! CLI definitions using clap.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Ad history CLI - record, query and purge ad events
#[derive(Parser, Debug)]
#[command(name = "adh", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: <data dir>/ad_history.db)
    #[arg(long, global = true, env = "ADH_DB")]
    pub db: Option<PathBuf>,

    /// Config file path (default: <config dir>/config.json)
    #[arg(long, global = true, env = "ADH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database and apply the schema
    Init {
        /// Recreate an existing database
        #[arg(long)]
        force: bool,
    },

    /// Record one ad event
    Record(RecordArgs),

    /// Import ad events from a JSON array
    Import {
        /// File containing a JSON array of ad history items
        file: PathBuf,
    },

    /// Show ad history for a date range
    History(HistoryArgs),

    /// Show ad history for a creative instance
    Creative {
        /// Creative instance ID
        id: String,
    },

    /// Delete ad history older than the retention period
    Purge,

    /// Pick the highest priority creative ads from a JSON array of candidates
    Rank {
        /// File containing a JSON array of creative ads
        file: PathBuf,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Ad type (ad_notification, new_tab_page_ad, promoted_content_ad,
    /// inline_content_ad, search_result_ad)
    #[arg(long = "ad-type", short = 't')]
    pub ad_type: String,

    /// Confirmation type (click, dismiss, view, served, landed, ...)
    #[arg(long = "confirmation-type", short = 'c')]
    pub confirmation_type: String,

    /// Placement ID (default: new UUID)
    #[arg(long)]
    pub placement_id: Option<String>,

    #[arg(long)]
    pub creative_instance_id: String,

    #[arg(long)]
    pub creative_set_id: String,

    #[arg(long)]
    pub campaign_id: String,

    #[arg(long)]
    pub advertiser_id: String,

    /// Landing page URL
    #[arg(long)]
    pub target_url: String,

    /// Taxonomy segment
    #[arg(long, default_value = "")]
    pub segment: String,

    #[arg(long, default_value = "")]
    pub title: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Event time as RFC 3339 (default: now)
    #[arg(long)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Look back this many days (default: the retention period)
    #[arg(long, conflicts_with = "from")]
    pub days: Option<u32>,

    /// Range start as RFC 3339
    #[arg(long)]
    pub from: Option<DateTime<Utc>>,

    /// Range end as RFC 3339 (default: now)
    #[arg(long)]
    pub to: Option<DateTime<Utc>>,

    /// Only the highest ranked event per placement
    #[arg(long)]
    pub top: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current settings
    Show,

    /// Change settings
    Set {
        /// Retention period in days
        #[arg(long)]
        retention_days: Option<u32>,

        /// Maximum rows per insert statement
        #[arg(long)]
        batch_size: Option<usize>,
    },
}
