//! Step execution layer
//!
//! This module contains the host-facing traits a step runs against and the
//! default implementations used when running standalone.

mod environment;
mod expand;
mod log;
mod process;
mod temp_files;
mod traits;

pub use environment::{HostEnvironment, build_variables};
pub use expand::{ExpansionPolicy, expand, expand_variables, unresolved_variables};
pub use log::{ConsoleLog, MemoryLog};
pub use process::{DryRunExecutor, ProcessExecutor};
pub use temp_files::{TempFile, TempFileManager, WORKSPACE_TMP_DIR};
pub use traits::{
    BuildContext, BuildLog, BuildStep, CommandExecutor, EnvironmentResolver, Launcher,
};
