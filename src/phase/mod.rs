//! The two phases of a cached job
//!
//! `restore` runs before the job's work and decides whether the current
//! tree was already processed. `save` runs after the work succeeded and
//! records the tree so the next identical run can skip it.

pub mod restore;
pub mod save;

pub use restore::{restore, RestoreOutcome, RestoreRequest, TreeSpec};
pub use save::{save, SaveOutcome, SaveRequest};
