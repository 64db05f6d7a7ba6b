//! Step execution traits
//!
//! This module defines the seams between a build step and its host: the
//! per-build context, environment resolution, command execution and the
//! build log.

use crate::docker::DockerCommand;
use crate::executor::ExpansionPolicy;
use crate::pipeline::{BuildResult, EnvironmentError};
use std::collections::HashMap;
use std::path::PathBuf;

/// A configured unit of work within a build
pub trait BuildStep {
    /// Runs the step and reports whether it succeeded
    ///
    /// Errors never escape a step: they are written to `log` and surface
    /// as `false`.
    fn perform(&self, build: &BuildContext, launcher: &Launcher<'_>, log: &mut dyn BuildLog)
    -> bool;
}

/// Resolves the environment a build's templates are expanded against
pub trait EnvironmentResolver {
    /// Produces the variable mapping for `build`
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentError`] when required context is unavailable.
    fn resolve(
        &self,
        build: &BuildContext,
        log: &mut dyn BuildLog,
    ) -> Result<HashMap<String, String>, EnvironmentError>;
}

/// Runs a container-engine command to completion
pub trait CommandExecutor {
    /// Executes `command` and returns whether the engine exited zero
    fn execute(&self, command: &DockerCommand, build: &BuildContext, log: &mut dyn BuildLog)
    -> bool;
}

/// Append-only text channel attached to a build
pub trait BuildLog {
    /// Appends a progress line
    fn println(&mut self, line: &str);

    /// Appends a fatal diagnostic
    fn fatal_error(&mut self, message: &str);
}

/// Host services handed to a step for one invocation
#[derive(Clone, Copy)]
pub struct Launcher<'a> {
    /// Runs engine commands
    pub executor: &'a dyn CommandExecutor,

    /// Resolves the build environment
    pub resolver: &'a dyn EnvironmentResolver,

    /// How unresolved `${VAR}` references are treated
    pub expansion: ExpansionPolicy,
}

impl<'a> Launcher<'a> {
    /// Creates a launcher with lenient macro expansion
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor, resolver: &'a dyn EnvironmentResolver) -> Self {
        Self {
            executor,
            resolver,
            expansion: ExpansionPolicy::Lenient,
        }
    }

    /// Sets the expansion policy
    #[must_use]
    pub fn with_expansion(mut self, expansion: ExpansionPolicy) -> Self {
        self.expansion = expansion;
        self
    }
}

/// Per-build record supplied by the host
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Name of the job the build belongs to
    pub job_name: String,

    /// Sequential build number
    pub build_number: u64,

    /// Unique build identifier
    pub build_id: String,

    /// Workspace directory; engine commands run here
    pub workspace: PathBuf,

    /// Build variables (parameters and injected values)
    pub variables: HashMap<String, String>,

    /// Result of the build so far, if the host has set one
    pub result: Option<BuildResult>,
}

impl BuildContext {
    /// Creates a new build context
    #[must_use]
    pub fn new(job_name: impl Into<String>, build_number: u64) -> Self {
        Self {
            job_name: job_name.into(),
            build_number,
            build_id: uuid::Uuid::new_v4().to_string(),
            workspace: std::env::current_dir().unwrap_or_default(),
            variables: HashMap::new(),
            result: None,
        }
    }

    /// Sets the workspace directory
    #[must_use]
    pub fn with_workspace(mut self, path: impl Into<PathBuf>) -> Self {
        self.workspace = path.into();
        self
    }

    /// Sets the build result
    #[must_use]
    pub fn with_result(mut self, result: BuildResult) -> Self {
        self.result = Some(result);
        self
    }

    /// Sets a build variable
    #[must_use]
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_variable(key, value);
        self
    }

    /// Sets a build variable in place
    pub fn set_variable(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Gets a build variable
    #[must_use]
    pub fn get_variable(&self, key: &str) -> Option<&String> {
        self.variables.get(key)
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new("job", 1)
    }
}
