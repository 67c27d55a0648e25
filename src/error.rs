//! Error types for tree-cache
//!
//! All modules use `TreeCacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tree-cache operations
pub type TreeCacheResult<T> = Result<T, TreeCacheError>;

/// All errors that can occur in tree-cache
#[derive(Error, Debug)]
pub enum TreeCacheError {
    // Input errors
    #[error("Missing required input: {0}")]
    MissingInput(&'static str),

    #[error("Invalid repository {0:?}, expected owner/repo")]
    InvalidRepository(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // Tree hash errors
    #[error("git rev-parse {revision}: failed: {stderr}")]
    GitRevParse { revision: String, stderr: String },

    #[error("Revision {revision} resolved to an empty tree hash")]
    EmptyTreeHash { revision: String },

    // Object store errors
    #[error("Failed to upload cache marker to s3://{bucket}/{key}: {stderr}")]
    Upload {
        bucket: String,
        key: String,
        stderr: String,
    },

    // Hand-off errors
    #[error("Cannot scope hand-off state to a job: no run id found")]
    HandoffScopeUnknown,

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TreeCacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingInput("bucket") => Some("Pass --bucket or set the bucket-name input"),
            Self::MissingInput("repository") => {
                Some("Pass --repository owner/repo or set GITHUB_REPOSITORY")
            }
            Self::GitRevParse { .. } | Self::EmptyTreeHash { .. } => {
                Some("Check out the repository with history before running restore")
            }
            Self::HandoffScopeUnknown => {
                Some("Pass --run-id, or run inside a CI job that sets GITHUB_RUN_ID or CI_JOB_ID")
            }
            Self::CommandFailed { .. } => Some("Make sure git and the aws CLI are on PATH"),
            _ => None,
        }
    }
}
