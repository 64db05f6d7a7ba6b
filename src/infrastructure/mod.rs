//! Infrastructure layer
//!
//! Configuration loading and logging setup.

mod config;
mod logging;

pub use config::{ConfigError, Settings, StepsFile};
pub use logging::init_logging;
