//! CLI command implementations

pub mod key;
pub mod restore;
pub mod save;

pub use key::execute as key;
pub use restore::execute as restore;
pub use save::execute as save;
