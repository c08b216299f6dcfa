//! Show ad history for one creative instance.

use crate::error::Result;
use std::path::Path;

use super::{load_config_handle, open_database, print_history, runtime};

/// Execute the creative command.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or queried.
pub fn execute(
    creative_instance_id: &str,
    db_path: Option<&Path>,
    config_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = load_config_handle(config_path)?;
    let rt = runtime()?;
    let items = rt.block_on(async {
        let ads = open_database(db_path, config).await?;
        ads.ad_history()
            .get_for_creative_instance_id(creative_instance_id)
            .await
    })?;

    print_history(&items, json)
}
