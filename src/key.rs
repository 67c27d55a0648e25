//! Cache key layout
//!
//! Keys live under `cache/{owner}/{repo}/{prefix}/{tree_hash}`. The prefix
//! is taken literally, so slashes in it add path segments.

use crate::error::{TreeCacheError, TreeCacheResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Object key of a cache marker
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build the key for a tree. Pure formatting, no validation.
    pub fn build(owner: &str, repo: &str, key_prefix: &str, tree_hash: &str) -> Self {
        Self(format!(
            "cache/{}/{}/{}/{}",
            owner, repo, key_prefix, tree_hash
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Repository namespace, parsed from `owner/repo`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl RepoSlug {
    /// Key for `tree_hash` in this repository's namespace
    pub fn cache_key(&self, key_prefix: &str, tree_hash: &str) -> CacheKey {
        CacheKey::build(&self.owner, &self.repo, key_prefix, tree_hash)
    }
}

impl FromStr for RepoSlug {
    type Err = TreeCacheError;

    fn from_str(s: &str) -> TreeCacheResult<Self> {
        match s.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() => Ok(Self {
                owner: owner.to_string(),
                repo: repo.to_string(),
            }),
            _ => Err(TreeCacheError::InvalidRepository(s.to_string())),
        }
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
