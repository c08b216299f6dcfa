//! Pick the highest priority creative ads from a candidate file.

use crate::error::{Error, Result};
use crate::serving::{CreativeAd, highest_priority, sort_into_buckets_by_priority};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Serialize)]
struct RankOutput {
    priority: Option<u32>,
    buckets: usize,
    creative_ads: Vec<CreativeAd>,
}

/// Execute the rank command.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn execute(file: &Path, json: bool) -> Result<()> {
    let content = fs::read_to_string(file)?;
    let candidates: Vec<CreativeAd> = serde_json::from_str(&content).map_err(|e| {
        Error::InvalidArgument(format!(
            "{} is not a JSON array of creative ads: {e}",
            file.display()
        ))
    })?;

    let buckets = sort_into_buckets_by_priority(&candidates).len();
    let creative_ads = highest_priority(&candidates);
    let priority = creative_ads.first().map(|ad| ad.priority);

    if json {
        let output = RankOutput {
            priority,
            buckets,
            creative_ads,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    let Some(priority) = priority else {
        println!("No eligible creative ads.");
        return Ok(());
    };

    println!(
        "{}: {} creative ad(s), {} bucket(s) in total",
        format!("Priority {priority}").cyan().bold(),
        creative_ads.len(),
        buckets
    );
    for ad in &creative_ads {
        println!("  {}  {}", ad.creative_instance_id.bold(), ad.segment.dimmed());
    }

    Ok(())
}
