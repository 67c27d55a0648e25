//! State hand-off between the restore and save invocations of one job
//!
//! Restore and save run as separate processes. Restore publishes the cache
//! key and tree hash here. Save reads them back, and an empty slot means
//! there is nothing to save.

use crate::error::{TreeCacheError, TreeCacheResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Slot holding the cache key
pub const KEY_SLOT: &str = "key";
/// Slot holding the tree hash
pub const HASH_SLOT: &str = "hash";

/// Job-scoped named string slots
#[async_trait]
pub trait Handoff: Send + Sync {
    async fn put(&self, name: &str, value: &str) -> TreeCacheResult<()>;

    async fn get(&self, name: &str) -> TreeCacheResult<Option<String>>;

    /// Drop everything stored for this job
    async fn clear(&self) -> TreeCacheResult<()>;

    fn backend_name(&self) -> &'static str;
}

/// Values restore leaves behind for save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffRecord {
    pub key: String,
    pub tree_hash: String,
}

impl HandoffRecord {
    pub async fn publish(&self, handoff: &dyn Handoff) -> TreeCacheResult<()> {
        handoff.put(KEY_SLOT, &self.key).await?;
        handoff.put(HASH_SLOT, &self.tree_hash).await?;
        debug!("Published hand-off via {}", handoff.backend_name());
        Ok(())
    }
}

/// GitHub Actions `$GITHUB_STATE` channel.
///
/// Values written in the main step come back to the post step of the
/// same job as `STATE_<name>` environment variables.
pub struct GithubStateHandoff {
    state_file: Option<PathBuf>,
    inherited: HashMap<String, String>,
}

impl GithubStateHandoff {
    pub fn new(state_file: Option<PathBuf>, inherited: HashMap<String, String>) -> Self {
        Self {
            state_file,
            inherited,
        }
    }

    pub fn from_env() -> Self {
        let inherited = std::env::vars()
            .filter_map(|(k, v)| k.strip_prefix("STATE_").map(|name| (name.to_string(), v)))
            .collect();
        Self::new(std::env::var_os("GITHUB_STATE").map(PathBuf::from), inherited)
    }
}

#[async_trait]
impl Handoff for GithubStateHandoff {
    async fn put(&self, name: &str, value: &str) -> TreeCacheResult<()> {
        let path = self
            .state_file
            .as_deref()
            .ok_or(TreeCacheError::MissingInput("GITHUB_STATE"))?;
        super::github::append_file_command(path, name, value).await
    }

    async fn get(&self, name: &str) -> TreeCacheResult<Option<String>> {
        Ok(self.inherited.get(name).cloned())
    }

    async fn clear(&self) -> TreeCacheResult<()> {
        // The runner discards state when the job ends
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "github"
    }
}

/// Prefix of the job environment variables used by [`GithubEnvHandoff`]
pub const ENV_PREFIX: &str = "TREE_CACHE_";

/// Job environment variable carrying a slot
pub fn env_var_name(slot: &str) -> String {
    format!("{}{}", ENV_PREFIX, slot.to_ascii_uppercase())
}

/// GitHub Actions `$GITHUB_ENV` channel.
///
/// Values appended in one step are set as `TREE_CACHE_<SLOT>` in every
/// later step of the same job, so plain `run:` steps can hand off.
pub struct GithubEnvHandoff {
    env_file: Option<PathBuf>,
    inherited: HashMap<String, String>,
}

impl GithubEnvHandoff {
    pub fn new(env_file: Option<PathBuf>, inherited: HashMap<String, String>) -> Self {
        Self {
            env_file,
            inherited,
        }
    }

    pub fn from_env() -> Self {
        let inherited = std::env::vars()
            .filter(|(k, _)| k.starts_with(ENV_PREFIX))
            .collect();
        Self::new(std::env::var_os("GITHUB_ENV").map(PathBuf::from), inherited)
    }

    fn env_file(&self) -> TreeCacheResult<&Path> {
        self.env_file
            .as_deref()
            .ok_or(TreeCacheError::MissingInput("GITHUB_ENV"))
    }
}

#[async_trait]
impl Handoff for GithubEnvHandoff {
    async fn put(&self, name: &str, value: &str) -> TreeCacheResult<()> {
        super::github::append_file_command(self.env_file()?, &env_var_name(name), value).await
    }

    async fn get(&self, name: &str) -> TreeCacheResult<Option<String>> {
        Ok(self.inherited.get(&env_var_name(name)).cloned())
    }

    async fn clear(&self) -> TreeCacheResult<()> {
        // Later steps see empty slots and skip
        let path = self.env_file()?;
        for slot in [KEY_SLOT, HASH_SLOT] {
            super::github::append_file_command(path, &env_var_name(slot), "").await?;
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "env"
    }
}

/// On-disk layout of a [`FileHandoff`] scope file
#[derive(Debug, Default, Serialize, Deserialize)]
struct ScopeFile {
    scope: String,
    updated_at: Option<DateTime<Utc>>,
    values: BTreeMap<String, String>,
}

/// JSON file per job, for runners without a state channel of their own.
///
/// The file name is derived from the job scope, so a later job never sees
/// an earlier job's values.
pub struct FileHandoff {
    scope: String,
    path: PathBuf,
}

impl FileHandoff {
    pub fn new(state_dir: &Path, scope: impl Into<String>) -> Self {
        let scope = scope.into();
        let digest = Sha256::digest(scope.as_bytes());
        let path = state_dir.join(format!("{}.json", hex::encode(digest)));
        Self { scope, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> TreeCacheResult<ScopeFile> {
        if !self.path.exists() {
            return Ok(ScopeFile {
                scope: self.scope.clone(),
                ..ScopeFile::default()
            });
        }

        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            TreeCacheError::io(format!("reading hand-off file {}", self.path.display()), e)
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn store(&self, file: &ScopeFile) -> TreeCacheResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| TreeCacheError::io("creating hand-off directory", e))?;
        }

        // Write-then-rename so a reader never sees half a file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(file)?)
            .await
            .map_err(|e| TreeCacheError::io(format!("writing {}", tmp.display()), e))?;
        fs::rename(&tmp, &self.path).await.map_err(|e| {
            TreeCacheError::io(format!("replacing hand-off file {}", self.path.display()), e)
        })?;
        Ok(())
    }
}

#[async_trait]
impl Handoff for FileHandoff {
    async fn put(&self, name: &str, value: &str) -> TreeCacheResult<()> {
        let mut file = self.load().await?;
        file.values.insert(name.to_string(), value.to_string());
        file.updated_at = Some(Utc::now());
        self.store(&file).await
    }

    async fn get(&self, name: &str) -> TreeCacheResult<Option<String>> {
        Ok(self.load().await?.values.get(name).cloned())
    }

    async fn clear(&self) -> TreeCacheResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).await.map_err(|e| {
                TreeCacheError::io(format!("removing hand-off file {}", self.path.display()), e)
            })?;
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

/// Identify the current CI job.
///
/// An explicit run id wins. Otherwise the first known runner variable is
/// used: GitHub Actions, then GitLab, then Buildkite.
pub fn job_scope(
    explicit: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> TreeCacheResult<String> {
    if let Some(run_id) = explicit.filter(|s| !s.is_empty()) {
        return Ok(format!("explicit:{}", run_id));
    }

    let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(run_id) = var("GITHUB_RUN_ID") {
        let attempt = var("GITHUB_RUN_ATTEMPT").unwrap_or_else(|| "1".to_string());
        let job = var("GITHUB_JOB").unwrap_or_default();
        return Ok(format!("github:{}:{}:{}", run_id, attempt, job));
    }
    if let Some(job_id) = var("CI_JOB_ID") {
        return Ok(format!("gitlab:{}", job_id));
    }
    if let Some(job_id) = var("BUILDKITE_JOB_ID") {
        return Ok(format!("buildkite:{}", job_id));
    }

    Err(TreeCacheError::HandoffScopeUnknown)
}
