//! Docker build and push steps
//!
//! Each step pairs an immutable configuration with a pure argument builder
//! and an orchestrator implementing [`BuildStep`](crate::executor::BuildStep).

mod build;
mod command;
mod push;
mod reference;


pub use build::{
    BuildFlags, BuildImageConfig, BuildImageFields, BuildImageStep, DockerfileSource,
    ResolvedBuild, ResourceLimits, build_arguments, parse_number,
};
pub use command::{DockerCommand, Subcommand};
pub use push::{PushImageConfig, PushImageStep, parse_tags, push_arguments};
pub use reference::ImageReference;
