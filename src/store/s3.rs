//! S3 object store driven through the AWS CLI

use super::{AwsOptions, ObjectStore, ProbeResult};
use crate::error::{TreeCacheError, TreeCacheResult};
use crate::exec::{CommandRunner, Invocation};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// S3 store using `aws s3api head-object` and `aws s3 cp`
pub struct AwsCliStore {
    runner: Arc<dyn CommandRunner>,
}

impl AwsCliStore {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn aws(aws: &AwsOptions) -> Invocation {
        aws.env_vars()
            .into_iter()
            .fold(Invocation::new("aws"), |inv, (name, value)| {
                inv.env(name, value)
            })
    }

    /// head-object reports a missing key as a 404 on stderr
    fn is_not_found(stderr: &str) -> bool {
        stderr.contains("(404)") || stderr.contains("Not Found")
    }
}

#[async_trait]
impl ObjectStore for AwsCliStore {
    async fn probe(&self, bucket: &str, key: &str, aws: &AwsOptions) -> ProbeResult {
        let invocation = Self::aws(aws).args([
            "s3api".to_string(),
            "head-object".to_string(),
            format!("--bucket={}", bucket),
            format!("--key={}", key),
        ]);

        match self.runner.run(&invocation).await {
            Ok(output) if output.success() => {
                debug!("Found s3://{}/{}", bucket, key);
                ProbeResult::Found
            }
            Ok(output) if Self::is_not_found(&output.stderr) => ProbeResult::NotFound,
            Ok(output) => ProbeResult::ProbeError(match output.code {
                Some(code) => format!("exit code {}: {}", code, output.stderr.trim()),
                None => "terminated by signal".to_string(),
            }),
            Err(e) => ProbeResult::ProbeError(e.to_string()),
        }
    }

    async fn write(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
        aws: &AwsOptions,
    ) -> TreeCacheResult<()> {
        let invocation = Self::aws(aws).args([
            "s3".to_string(),
            "cp".to_string(),
            local_path.display().to_string(),
            format!("s3://{}/{}", bucket, key),
        ]);

        let output = self.runner.run(&invocation).await?;
        if output.success() {
            Ok(())
        } else {
            Err(TreeCacheError::Upload {
                bucket: bucket.to_string(),
                key: key.to_string(),
                stderr: output.stderr.trim().to_string(),
            })
        }
    }
}
