//! Configuration schema for tree-cache
//!
//! Configuration is read from `.tree-cache.toml` in the repository (or the
//! file given with `--config`). Every value can be overridden on the
//! command line. Credentials are never read from this file.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Object store settings
    pub store: StoreConfig,

    /// Restore/save hand-off settings
    pub handoff: HandoffConfig,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// General application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: LogFormat,
}

/// Object store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// S3 bucket holding the cache markers
    pub bucket: Option<String>,

    /// Extra key segment(s) between the repository and the tree hash
    pub key_prefix: String,

    /// AWS region of the bucket
    pub region: Option<String>,
}

/// Hand-off channel selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HandoffBackend {
    /// GitHub job environment when available, otherwise a per-job file
    #[default]
    Auto,
    /// `$GITHUB_ENV` / `TREE_CACHE_*`, visible to every later step of the job
    Env,
    /// `$GITHUB_STATE` / `STATE_*`, only read back by an action's post step
    Github,
    /// JSON file in the state directory, scoped by job id
    File,
}

/// Restore/save hand-off settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoffConfig {
    pub backend: HandoffBackend,

    /// Directory for the file backend (default: platform state dir)
    pub state_dir: Option<PathBuf>,
}
