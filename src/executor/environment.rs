//! Build environment resolution
//!
//! [`HostEnvironment`] assembles the variables a step expands its templates
//! against. Later sources override earlier ones:
//!
//! 1. The process environment (when inherited)
//! 2. The standard build variables
//! 3. The build's own variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `WORKSPACE` | Workspace directory |
//! | `WORKSPACE_TMP` | Temporary directory (`@tmp`) |
//! | `BUILD_NUMBER` | Build number |
//! | `BUILD_ID` | Build ID (UUID) |
//! | `JOB_NAME` | Name of the job |
//! | `BUILD_RESULT` | Result so far, when the host has set one |

use super::traits::{BuildContext, BuildLog, EnvironmentResolver};
use super::WORKSPACE_TMP_DIR;
use crate::pipeline::EnvironmentError;
use std::collections::HashMap;

/// Default resolver backed by the build context and the process environment
#[derive(Debug, Clone)]
pub struct HostEnvironment {
    inherit_process_env: bool,
    required: Vec<String>,
}

impl HostEnvironment {
    /// Creates a resolver that inherits the process environment
    #[must_use]
    pub fn new() -> Self {
        Self {
            inherit_process_env: true,
            required: Vec::new(),
        }
    }

    /// Controls whether process environment variables are resolved
    ///
    /// This only affects template expansion; the engine process always
    /// inherits the process environment.
    #[must_use]
    pub fn inherit_process_env(mut self, inherit: bool) -> Self {
        self.inherit_process_env = inherit;
        self
    }

    /// Adds variables that must be present after resolution
    #[must_use]
    pub fn require<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(names.into_iter().map(Into::into));
        self
    }
}

impl Default for HostEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the standard variables for `build`
#[must_use]
pub fn build_variables(build: &BuildContext) -> HashMap<String, String> {
    let mut env = HashMap::from([
        (
            "WORKSPACE".to_string(),
            build.workspace.to_string_lossy().to_string(),
        ),
        (
            "WORKSPACE_TMP".to_string(),
            build
                .workspace
                .join(WORKSPACE_TMP_DIR)
                .to_string_lossy()
                .to_string(),
        ),
        ("BUILD_NUMBER".to_string(), build.build_number.to_string()),
        ("BUILD_ID".to_string(), build.build_id.clone()),
        ("JOB_NAME".to_string(), build.job_name.clone()),
    ]);

    if let Some(result) = build.result {
        env.insert("BUILD_RESULT".to_string(), result.to_string());
    }

    env
}

impl EnvironmentResolver for HostEnvironment {
    fn resolve(
        &self,
        build: &BuildContext,
        _log: &mut dyn BuildLog,
    ) -> Result<HashMap<String, String>, EnvironmentError> {
        let mut env: HashMap<String, String> = if self.inherit_process_env {
            std::env::vars().collect()
        } else {
            HashMap::new()
        };

        env.extend(build_variables(build));
        env.extend(
            build
                .variables
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        if let Some(name) = self.required.iter().find(|name| !env.contains_key(*name)) {
            return Err(EnvironmentError::MissingVariable { name: name.clone() });
        }

        tracing::debug!(
            job = %build.job_name,
            build_number = build.build_number,
            variables = env.len(),
            "Resolved build environment"
        );

        Ok(env)
    }
}
