//! Tree hash derivation using the git CLI
//!
//! The root tree object of a commit captures the state of every tracked
//! file, so two checkouts with identical content resolve to the same hash
//! no matter how they got there.

use crate::error::{TreeCacheError, TreeCacheResult};
use crate::exec::{CommandRunner, Invocation};
use std::path::Path;
use tracing::debug;

/// Revision used when none is given
pub const DEFAULT_REVISION: &str = "HEAD";

/// Resolve the root tree hash of `revision` in the repository containing
/// `repo_dir`.
///
/// Runs `git rev-parse <revision>:` and returns its trimmed stdout as-is,
/// which may be empty.
pub async fn tree_hash_for(
    runner: &dyn CommandRunner,
    repo_dir: &Path,
    revision: &str,
) -> TreeCacheResult<String> {
    // `<rev>:` is the root tree, even when repo_dir is a subdirectory
    let invocation = Invocation::new("git")
        .arg("rev-parse")
        .arg(format!("{}:", revision))
        .current_dir(repo_dir);

    let output = runner.run(&invocation).await?;
    if !output.success() {
        return Err(TreeCacheError::GitRevParse {
            revision: revision.to_string(),
            stderr: output.stderr.trim().to_string(),
        });
    }

    let hash = output.stdout.trim().to_string();
    debug!("Tree hash for {}: {:?}", revision, hash);
    Ok(hash)
}

/// Resolve the root tree hash of the current checkout
pub async fn current_repo_tree_hash(
    runner: &dyn CommandRunner,
    repo_dir: &Path,
) -> TreeCacheResult<String> {
    tree_hash_for(runner, repo_dir, DEFAULT_REVISION).await
}
