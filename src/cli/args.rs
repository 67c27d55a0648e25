//! CLI argument definitions using clap derive
//!
//! Inputs fall back to the `INPUT_*` variables a GitHub Actions runner
//! sets for action inputs, so the binary can back an action directly.

use crate::config::schema::{HandoffBackend, HandoffConfig, LogFormat, StoreConfig};
use crate::error::{TreeCacheError, TreeCacheResult};
use crate::git::DEFAULT_REVISION;
use crate::key::RepoSlug;
use crate::phase::TreeSpec;
use crate::store::AwsOptions;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// tree-cache - skip CI work for trees that were already processed
///
/// Fingerprints the repository with its git tree hash and keeps a marker
/// per processed tree in S3.
#[derive(Parser, Debug)]
#[command(name = "tree-cache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path (default: .tree-cache.toml in the repository)
    #[arg(short, long, global = true, env = "TREE_CACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, env = "TREE_CACHE_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check whether the current tree was already processed (pre-job)
    Restore(RestoreArgs),

    /// Record the current tree as processed (post-job)
    Save(SaveArgs),

    /// Print the cache key for the current tree without contacting S3
    Key(KeyArgs),
}

/// Bucket and AWS credentials
#[derive(Args, Debug, Default)]
pub struct StoreArgs {
    /// S3 bucket holding the cache markers
    #[arg(long, env = "INPUT_BUCKET-NAME")]
    pub bucket: Option<String>,

    /// AWS region of the bucket
    #[arg(long, env = "INPUT_AWS-REGION")]
    pub aws_region: Option<String>,

    /// AWS access key id
    #[arg(long, env = "INPUT_AWS-ACCESS-KEY-ID", hide_env_values = true)]
    pub aws_access_key_id: Option<String>,

    /// AWS secret access key
    #[arg(long, env = "INPUT_AWS-SECRET-ACCESS-KEY", hide_env_values = true)]
    pub aws_secret_access_key: Option<String>,
}

impl StoreArgs {
    /// Bucket from the command line, then the config file
    pub fn bucket(&self, config: &StoreConfig) -> TreeCacheResult<String> {
        non_empty(&self.bucket)
            .or_else(|| non_empty(&config.bucket))
            .ok_or(TreeCacheError::MissingInput("bucket"))
    }

    pub fn aws_options(&self, config: &StoreConfig) -> AwsOptions {
        AwsOptions::new(
            non_empty(&self.aws_region)
                .or_else(|| non_empty(&config.region))
                .unwrap_or_default(),
            self.aws_access_key_id.clone().unwrap_or_default(),
            self.aws_secret_access_key.clone().unwrap_or_default(),
        )
    }
}

/// Which tree to fingerprint and how to name it
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Repository namespace as owner/repo
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    /// Key segment(s) between the repository and the tree hash
    #[arg(long, env = "INPUT_KEY-PREFIX")]
    pub key_prefix: Option<String>,

    /// Revision whose root tree is hashed
    #[arg(long, default_value = DEFAULT_REVISION)]
    pub revision: String,

    /// Directory inside the repository
    #[arg(long, default_value = ".")]
    pub repo_dir: PathBuf,
}

impl TreeArgs {
    pub fn repo_slug(&self) -> TreeCacheResult<RepoSlug> {
        non_empty(&self.repository)
            .ok_or(TreeCacheError::MissingInput("repository"))?
            .parse()
    }

    /// Prefix from the command line, then the config file. An explicit
    /// empty value on the command line wins.
    pub fn key_prefix(&self, config: &StoreConfig) -> String {
        self.key_prefix
            .clone()
            .unwrap_or_else(|| config.key_prefix.clone())
    }

    pub fn spec(&self, config: &StoreConfig) -> TreeCacheResult<TreeSpec> {
        Ok(TreeSpec {
            repo: self.repo_slug()?,
            key_prefix: self.key_prefix(config),
            revision: self.revision.clone(),
            repo_dir: self.repo_dir.clone(),
        })
    }
}

/// Hand-off channel selection
#[derive(Args, Debug, Default)]
pub struct HandoffArgs {
    /// Hand-off backend between restore and save
    #[arg(long = "handoff", value_enum)]
    pub backend: Option<HandoffBackend>,

    /// Job identifier scoping the file hand-off
    #[arg(long, env = "TREE_CACHE_RUN_ID")]
    pub run_id: Option<String>,

    /// Directory for the file hand-off
    #[arg(long)]
    pub state_dir: Option<PathBuf>,
}

impl HandoffArgs {
    pub fn resolve(&self, config: &HandoffConfig) -> HandoffConfig {
        HandoffConfig {
            backend: self.backend.unwrap_or(config.backend),
            state_dir: self.state_dir.clone().or_else(|| config.state_dir.clone()),
        }
    }
}

/// Arguments for the restore command
#[derive(Args, Debug)]
pub struct RestoreArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub tree: TreeArgs,

    #[command(flatten)]
    pub handoff: HandoffArgs,
}

/// Arguments for the save command
#[derive(Args, Debug)]
pub struct SaveArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub handoff: HandoffArgs,

    /// Directory for the local marker file
    #[arg(long, env = "RUNNER_TEMP")]
    pub work_dir: Option<PathBuf>,
}

/// Arguments for the key command
#[derive(Args, Debug)]
pub struct KeyArgs {
    #[command(flatten)]
    pub tree: TreeArgs,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|s| !s.is_empty()).map(str::to_owned)
}
