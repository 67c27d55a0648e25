//! Save phase: record a processed tree in the store

use crate::error::{TreeCacheError, TreeCacheResult};
use crate::store::{AwsOptions, ObjectStore};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Inputs of the save phase; `hash` and `key` come from the hand-off
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub bucket: String,
    pub hash: Option<String>,
    pub key: Option<String>,
    pub aws: AwsOptions,
    /// Directory the local marker file is written to
    pub work_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing pending from restore
    Skipped,
    Written { key: String },
}

/// Upload the marker for the tree restore saw.
///
/// Existence is not checked again; restore already did that.
pub async fn save(
    request: &SaveRequest,
    store: &dyn ObjectStore,
) -> TreeCacheResult<SaveOutcome> {
    let non_empty = |v: &Option<String>| {
        v.as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };
    let (Some(hash), Some(key)) = (non_empty(&request.hash), non_empty(&request.key)) else {
        info!("Tree hash already processed, skipping saving the cache file.");
        return Ok(SaveOutcome::Skipped);
    };

    let marker = write_marker(&request.work_dir, &hash).await?;
    store
        .write(&marker, &request.bucket, &key, &request.aws)
        .await?;

    info!(
        "Tree hash {} was processed, saved the {} cache file.",
        hash, key
    );
    Ok(SaveOutcome::Written { key })
}

/// Write `<dir>/<hash>` containing the hash. Only its existence in the
/// store matters, so the content is never read back.
async fn write_marker(dir: &Path, hash: &str) -> TreeCacheResult<PathBuf> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| TreeCacheError::io(format!("creating {}", dir.display()), e))?;

    let path = dir.join(hash);
    fs::write(&path, format!("{}\n", hash))
        .await
        .map_err(|e| TreeCacheError::io(format!("writing marker {}", path.display()), e))?;
    Ok(path)
}
