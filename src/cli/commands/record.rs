//! Record a single ad event.

use crate::cli::RecordArgs;
use crate::error::{Error, Result};
use crate::model::{AdHistoryItem, parse_target_url};
use crate::timestamp;
use crate::validate::{normalize_ad_type, normalize_confirmation_type};
use chrono::SubsecRound;
use std::path::Path;

use super::{load_config_handle, open_database, runtime};

/// Execute the record command.
///
/// # Errors
///
/// Returns `InvalidArgument` if the event does not form a valid ad history
/// item, or an error if it cannot be saved.
pub fn execute(
    args: &RecordArgs,
    db_path: Option<&Path>,
    config_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let item = build_item(args)?;

    let config = load_config_handle(config_path)?;
    let rt = runtime()?;
    rt.block_on(async {
        let ads = open_database(db_path, config).await?;
        ads.ad_history().save(std::slice::from_ref(&item)).await
    })?;

    if json {
        println!("{}", serde_json::to_string(&item)?);
    } else {
        println!(
            "Recorded {} for {} placement {}",
            item.confirmation_type, item.ad_type, item.placement_id
        );
    }

    Ok(())
}

fn build_item(args: &RecordArgs) -> Result<AdHistoryItem> {
    let ad_type = normalize_ad_type(&args.ad_type).map_err(|(input, suggestion)| {
        invalid("ad type", &input, suggestion)
    })?;
    let confirmation_type =
        normalize_confirmation_type(&args.confirmation_type).map_err(|(input, suggestion)| {
            invalid("confirmation type", &input, suggestion)
        })?;

    let target_url = parse_target_url(&args.target_url)
        .filter(url::Url::has_host)
        .ok_or_else(|| {
            Error::InvalidArgument(format!("Invalid target URL: {}", args.target_url))
        })?;

    let item = AdHistoryItem {
        created_at: args
            .created_at
            .map_or_else(timestamp::now, |created_at| created_at.trunc_subsecs(6)),
        ad_type,
        confirmation_type,
        placement_id: args
            .placement_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        creative_instance_id: args.creative_instance_id.clone(),
        creative_set_id: args.creative_set_id.clone(),
        campaign_id: args.campaign_id.clone(),
        advertiser_id: args.advertiser_id.clone(),
        segment: args.segment.clone(),
        title: args.title.clone(),
        description: args.description.clone(),
        target_url: Some(target_url),
    };

    if !item.is_valid() {
        return Err(Error::InvalidArgument(
            "Identifiers must not be empty".to_string(),
        ));
    }

    Ok(item)
}

fn invalid(what: &str, input: &str, suggestion: Option<String>) -> Error {
    match suggestion {
        Some(suggestion) => Error::InvalidArgument(format!(
            "Invalid {what}: {input} (did you mean '{suggestion}'?)"
        )),
        None => Error::InvalidArgument(format!("Invalid {what}: {input}")),
    }
}
