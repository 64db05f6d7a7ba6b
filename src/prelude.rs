//! Prelude module for common imports

// Step configuration and the steps themselves
pub use crate::docker::{
    BuildFlags, BuildImageConfig, BuildImageStep, DockerfileSource, ImageReference,
    PushImageConfig, PushImageStep, ResourceLimits,
};

// Build domain types
pub use crate::pipeline::{BuildResult, BuildTrigger, EnvironmentError, StepError};

// Re-export executor types
pub use crate::executor::{
    BuildContext, BuildLog, BuildStep, CommandExecutor, ConsoleLog, DryRunExecutor,
    EnvironmentResolver, ExpansionPolicy, HostEnvironment, Launcher, MemoryLog, ProcessExecutor,
};

pub use crate::infrastructure::{Settings, StepsFile};
