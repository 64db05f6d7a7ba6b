//! Build domain types
//!
//! Outcomes a host assigns to a build, the trigger modes that gate
//! post-build steps on them, and the errors a step can stop on.

pub mod errors;
pub mod trigger;
pub mod types;

pub use errors::{EnvironmentError, StepError};
pub use trigger::BuildTrigger;
pub use types::BuildResult;
