//! Remote object store for cache markers
//!
//! Markers are presence flags: only whether an object exists at a key
//! matters, never its content.

mod credentials;
mod s3;

pub use credentials::AwsOptions;
pub use s3::AwsCliStore;

use crate::error::TreeCacheResult;
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, warn};

/// Outcome of an existence probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    Found,
    NotFound,
    /// The probe itself failed (auth, network, bad bucket, missing CLI)
    ProbeError(String),
}

/// Bucket + key addressed blob store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Look up an object, keeping the reason when the lookup fails
    async fn probe(&self, bucket: &str, key: &str, aws: &AwsOptions) -> ProbeResult;

    /// Upload a local file to `bucket`/`key`
    async fn write(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
        aws: &AwsOptions,
    ) -> TreeCacheResult<()>;

    /// Whether an object exists at `bucket`/`key`.
    ///
    /// Probe errors count as "does not exist": the worst outcome is a
    /// redundant marker upload.
    async fn exists(&self, bucket: &str, key: &str, aws: &AwsOptions) -> bool {
        match self.probe(bucket, key, aws).await {
            ProbeResult::Found => true,
            ProbeResult::NotFound => {
                debug!("No object at s3://{}/{}", bucket, key);
                false
            }
            ProbeResult::ProbeError(reason) => {
                warn!(
                    "Could not check s3://{}/{}, treating as missing: {}",
                    bucket, key, reason
                );
                false
            }
        }
    }
}
