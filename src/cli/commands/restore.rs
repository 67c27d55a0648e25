//! Restore command - check the store for the current tree

use crate::cli::args::RestoreArgs;
use crate::config::Config;
use crate::error::TreeCacheResult;
use crate::exec::{CommandRunner, SystemRunner};
use crate::host::{open_handoff, JobOutputs};
use crate::phase::{self, RestoreRequest};
use crate::store::AwsCliStore;
use std::sync::Arc;

/// Execute the restore command
pub async fn execute(args: RestoreArgs, config: &Config) -> TreeCacheResult<()> {
    let request = RestoreRequest {
        bucket: args.store.bucket(&config.store)?,
        tree: args.tree.spec(&config.store)?,
        aws: args.store.aws_options(&config.store),
    };

    let handoff = open_handoff(
        &args.handoff.resolve(&config.handoff),
        args.handoff.run_id.as_deref(),
    )?;

    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
    let store = AwsCliStore::new(runner.clone());

    let outcome = phase::restore(&request, runner.as_ref(), &store, handoff.as_ref()).await?;

    let outputs = JobOutputs::from_env();
    outputs
        .set("processed", if outcome.processed { "true" } else { "false" })
        .await?;
    outputs.set("hash", &outcome.tree_hash).await?;

    Ok(())
}
