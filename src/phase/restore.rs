//! Restore phase: has this tree already been processed?

use crate::error::{TreeCacheError, TreeCacheResult};
use crate::exec::CommandRunner;
use crate::git;
use crate::host::{Handoff, HandoffRecord};
use crate::key::{CacheKey, RepoSlug};
use crate::store::{AwsOptions, ObjectStore};
use std::path::PathBuf;
use tracing::{debug, info};

/// Which tree to fingerprint and where its key lives
#[derive(Debug, Clone)]
pub struct TreeSpec {
    pub repo: RepoSlug,
    pub key_prefix: String,
    /// Revision whose tree is fingerprinted, usually `HEAD`
    pub revision: String,
    /// Any directory inside the repository
    pub repo_dir: PathBuf,
}

impl TreeSpec {
    /// Resolve the tree hash and build its key.
    ///
    /// An empty tree hash is rejected: it would map every unresolvable
    /// revision onto one shared marker.
    pub async fn resolve(
        &self,
        runner: &dyn CommandRunner,
    ) -> TreeCacheResult<(String, CacheKey)> {
        let tree_hash = git::tree_hash_for(runner, &self.repo_dir, &self.revision).await?;
        if tree_hash.is_empty() {
            return Err(TreeCacheError::EmptyTreeHash {
                revision: self.revision.clone(),
            });
        }
        debug!("Tree hash computed: {}", tree_hash);

        let key = self.repo.cache_key(&self.key_prefix, &tree_hash);
        debug!("Cache key built: {}", key);
        Ok((tree_hash, key))
    }
}

/// Inputs of the restore phase
#[derive(Debug, Clone)]
pub struct RestoreRequest {
    pub bucket: String,
    pub tree: TreeSpec,
    pub aws: AwsOptions,
}

/// Result of the restore phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreOutcome {
    pub processed: bool,
    pub tree_hash: String,
    pub key: CacheKey,
}

/// Check the store for this tree's marker.
///
/// The key and tree hash are published to `handoff` whether or not the
/// marker exists.
pub async fn restore(
    request: &RestoreRequest,
    runner: &dyn CommandRunner,
    store: &dyn ObjectStore,
    handoff: &dyn Handoff,
) -> TreeCacheResult<RestoreOutcome> {
    let (tree_hash, key) = request.tree.resolve(runner).await?;

    let processed = store
        .exists(&request.bucket, key.as_str(), &request.aws)
        .await;

    if processed {
        info!("Tree hash {} already processed.", tree_hash);
    } else {
        info!("Tree hash {} has not been processed yet.", tree_hash);
    }

    HandoffRecord {
        key: key.to_string(),
        tree_hash: tree_hash.clone(),
    }
    .publish(handoff)
    .await?;

    Ok(RestoreOutcome {
        processed,
        tree_hash,
        key,
    })
}
