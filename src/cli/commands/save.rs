//! Save command - upload the marker restore left pending

use crate::cli::args::SaveArgs;
use crate::config::Config;
use crate::error::{TreeCacheError, TreeCacheResult};
use crate::exec::SystemRunner;
use crate::host::{open_handoff, HASH_SLOT, KEY_SLOT};
use crate::phase::{self, SaveRequest};
use crate::store::AwsCliStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Execute the save command
pub async fn execute(args: SaveArgs, config: &Config) -> TreeCacheResult<()> {
    let bucket = args.store.bucket(&config.store)?;
    let aws = args.store.aws_options(&config.store);

    let handoff = match open_handoff(
        &args.handoff.resolve(&config.handoff),
        args.handoff.run_id.as_deref(),
    ) {
        Ok(handoff) => handoff,
        // Restore could not have stored anything without a job scope either
        Err(TreeCacheError::HandoffScopeUnknown) => {
            warn!("No job scope for the hand-off, nothing to save");
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let request = SaveRequest {
        bucket,
        hash: handoff.get(HASH_SLOT).await?,
        key: handoff.get(KEY_SLOT).await?,
        aws,
        work_dir: args.work_dir.unwrap_or_else(std::env::temp_dir),
    };
    debug!("Marker directory: {}", request.work_dir.display());

    let store = AwsCliStore::new(Arc::new(SystemRunner));
    phase::save(&request, &store).await?;

    // The record is consumed; a second save in this job is a no-op
    handoff.clear().await?;
    Ok(())
}
