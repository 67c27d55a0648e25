//! tree-cache - two-phase CI build cache
//!
//! Fingerprints the repository by its git root tree hash, checks an S3
//! bucket for a marker at `cache/{owner}/{repo}/{prefix}/{tree_hash}`
//! before a job, and uploads the marker after the job succeeded.

pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod git;
pub mod host;
pub mod key;
pub mod phase;
pub mod store;

pub use error::{TreeCacheError, TreeCacheResult};
