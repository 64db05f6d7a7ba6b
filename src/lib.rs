//! # Dockstep - Docker build and push steps for CI builds
//!
//! Dockstep builds container images from a Dockerfile and pushes them to a
//! registry on behalf of a CI build. Each step turns its configuration into
//! a `docker` invocation, streams the engine's output into the build log,
//! and reports success or failure back to the host.
//!
//! ## Quick Start
//!
//! ```no_run
//! use dockstep::prelude::*;
//!
//! let config = BuildImageConfig::new("ghcr.io/team/app", "${BUILD_NUMBER}");
//! let step = BuildImageStep::new(config);
//!
//! let executor = ProcessExecutor::default();
//! let resolver = HostEnvironment::default();
//! let launcher = Launcher::new(&executor, &resolver);
//!
//! let build = BuildContext::new("app", 42).with_workspace("/var/ci/app");
//! let mut log = ConsoleLog;
//! let succeeded = step.perform(&build, &launcher, &mut log);
//! # let _ = succeeded;
//! ```
//!
//! ## Features
//!
//! - **Build**: resource limits, cache and pull flags, path or inline Dockerfiles
//! - **Push**: comma-separated tags, gated on the build result
//! - **Variables**: `${VAR}` expansion from the build environment
//! - **Dry runs**: record engine commands without running them
//!
//! ## License
//!
//! Licensed under either of
//! - Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <https://www.apache.org/licenses/LICENSE-2.0>)
//! - MIT license ([LICENSE-MIT](LICENSE-MIT) or <https://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod docker;
pub mod executor;
pub mod infrastructure;
pub mod pipeline;

// Prelude module for common imports
pub mod prelude;

// Re-export commonly used types
pub use docker::{
    BuildImageConfig, BuildImageStep, DockerCommand, ImageReference, PushImageConfig,
    PushImageStep,
};
pub use executor::{
    BuildContext, BuildLog, BuildStep, CommandExecutor, DryRunExecutor, EnvironmentResolver,
    ExpansionPolicy, HostEnvironment, Launcher, ProcessExecutor, TempFileManager,
    expand_variables,
};
pub use infrastructure::{Settings, StepsFile};
pub use pipeline::{BuildResult, BuildTrigger, EnvironmentError, StepError};

/// Version of the dockstep crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
