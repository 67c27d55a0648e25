//! Step outputs visible to later steps of the job

use crate::error::TreeCacheResult;
use std::path::PathBuf;

/// Where step outputs go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutputs {
    /// `$GITHUB_OUTPUT` file command
    GithubFile(PathBuf),
    /// `name=value` lines on stdout
    Stdout,
}

impl JobOutputs {
    pub fn from_env() -> Self {
        match std::env::var_os("GITHUB_OUTPUT") {
            Some(path) if !path.is_empty() => Self::GithubFile(PathBuf::from(path)),
            _ => Self::Stdout,
        }
    }

    pub async fn set(&self, name: &str, value: &str) -> TreeCacheResult<()> {
        match self {
            Self::GithubFile(path) => super::github::append_file_command(path, name, value).await,
            Self::Stdout => {
                println!("{}={}", name, value);
                Ok(())
            }
        }
    }
}
