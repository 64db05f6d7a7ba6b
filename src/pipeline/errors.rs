//! Error types for the build step domain

use thiserror::Error;

/// Errors raised while preparing a step's environment
///
/// These are always fatal to the step invocation that raised them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentError {
    /// A variable the step requires is not present in the environment
    #[error("required variable '{name}' is not set")]
    MissingVariable {
        /// Name of the missing variable.
        name: String,
    },

    /// A `${VAR}` reference could not be resolved under strict expansion
    #[error("unresolved variable '{variable}' in '{template}'")]
    UnresolvedVariable {
        /// Name of the unresolved variable.
        variable: String,
        /// Template the reference appeared in.
        template: String,
    },

    /// The workspace is unusable
    #[error("workspace error: {0}")]
    Workspace(String),
}

/// Errors that stop a step before or between engine invocations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// Environment resolution or macro expansion failed
    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StepError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_error_display() {
        let err = EnvironmentError::MissingVariable {
            name: "REGISTRY".to_string(),
        };
        assert_eq!(err.to_string(), "required variable 'REGISTRY' is not set");

        let err = EnvironmentError::UnresolvedVariable {
            variable: "TAG".to_string(),
            template: "app:${TAG}".to_string(),
        };
        assert_eq!(err.to_string(), "unresolved variable 'TAG' in 'app:${TAG}'");
    }

    #[test]
    fn test_step_error_wraps_environment_error() {
        let err: StepError = EnvironmentError::Workspace("gone".to_string()).into();
        assert_eq!(err.to_string(), "workspace error: gone");
    }

    #[test]
    fn test_step_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StepError::from(io);
        assert_eq!(err, StepError::Io("denied".to_string()));
    }
}
