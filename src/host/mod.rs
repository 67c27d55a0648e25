//! CI host integration
//!
//! - `handoff`: job-scoped state shared by restore and save
//! - `outputs`: step outputs for later steps
//! - `github`: GitHub Actions file commands and annotations

pub mod github;
pub mod handoff;
pub mod outputs;

pub use handoff::{
    FileHandoff, GithubEnvHandoff, GithubStateHandoff, Handoff, HandoffRecord, HASH_SLOT, KEY_SLOT,
};
pub use outputs::JobOutputs;

use crate::config::schema::{HandoffBackend, HandoffConfig};
use crate::config::ConfigManager;
use crate::error::TreeCacheResult;
use tracing::debug;

/// Open the hand-off channel for this job.
///
/// `Auto` picks the GitHub job environment when the runner provides one and
/// a per-job JSON file otherwise. `$GITHUB_STATE` is never picked on its own:
/// it only reaches the post step of the action that wrote it.
pub fn open_handoff(
    config: &HandoffConfig,
    run_id: Option<&str>,
) -> TreeCacheResult<Box<dyn Handoff>> {
    let backend = match config.backend {
        HandoffBackend::Auto if std::env::var_os("GITHUB_ENV").is_some() => HandoffBackend::Env,
        HandoffBackend::Auto => HandoffBackend::File,
        other => other,
    };

    let handoff: Box<dyn Handoff> = match backend {
        HandoffBackend::Env => Box::new(GithubEnvHandoff::from_env()),
        HandoffBackend::Github => Box::new(GithubStateHandoff::from_env()),
        _ => {
            let scope = handoff::job_scope(run_id, |name| std::env::var(name).ok())?;
            let state_dir = config
                .state_dir
                .clone()
                .unwrap_or_else(ConfigManager::handoff_dir);
            let file = FileHandoff::new(&state_dir, scope);
            debug!("Hand-off file: {}", file.path().display());
            Box::new(file)
        }
    };

    debug!("Using {} hand-off", handoff.backend_name());
    Ok(handoff)
}
