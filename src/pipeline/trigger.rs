//! Trigger modes for post-build steps
//!
//! A post-build step only does work when the upstream build ended in an
//! outcome its trigger mode accepts.

#![allow(clippy::must_use_candidate)]

use super::BuildResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Condition gating whether a post-build step executes
///
/// Persisted as a plain string. `SUCCESS` and `FAILURE` are recognised;
/// any other value is kept verbatim and never triggers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuildTrigger {
    /// Run when the upstream build succeeded or is unstable
    #[default]
    Success,
    /// Run when the upstream build failed
    Failure,
    /// Unrecognised mode; the step is a no-op
    Never(String),
}

impl BuildTrigger {
    /// Returns true if a step with this trigger should run after `result`
    ///
    /// A build with no result yet never triggers.
    pub fn should_run(&self, result: Option<BuildResult>) -> bool {
        match (self, result) {
            (Self::Success, Some(BuildResult::Success | BuildResult::Unstable))
            | (Self::Failure, Some(BuildResult::Failure)) => true,
            _ => false,
        }
    }

    /// Returns true for a mode that is neither `SUCCESS` nor `FAILURE`
    pub fn is_recognised(&self) -> bool {
        !matches!(self, Self::Never(_))
    }
}

impl From<String> for BuildTrigger {
    fn from(value: String) -> Self {
        match value.as_str() {
            "SUCCESS" => Self::Success,
            "FAILURE" => Self::Failure,
            _ => Self::Never(value),
        }
    }
}

impl From<&str> for BuildTrigger {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<BuildTrigger> for String {
    fn from(trigger: BuildTrigger) -> Self {
        match trigger {
            BuildTrigger::Success => "SUCCESS".to_string(),
            BuildTrigger::Failure => "FAILURE".to_string(),
            BuildTrigger::Never(raw) => raw,
        }
    }
}

impl fmt::Display for BuildTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Failure => write!(f, "FAILURE"),
            Self::Never(raw) => write!(f, "{raw}"),
        }
    }
}
