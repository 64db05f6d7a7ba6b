//! Core types for the build domain
//!
//! This module contains the terminal outcomes a CI host assigns to a build.

#![allow(clippy::must_use_candidate)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Possible outcomes of a build, as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    /// Build completed successfully
    Success,
    /// Build completed but was marked unstable (e.g. test failures)
    Unstable,
    /// Build failed
    Failure,
    /// Build was never run
    NotBuilt,
    /// Build was aborted
    Aborted,
}

impl BuildResult {
    /// Returns true if result is successful
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns true if result is a failure
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure)
    }

    /// Returns true if result is unstable
    #[must_use]
    pub fn is_unstable(&self) -> bool {
        matches!(self, Self::Unstable)
    }

    /// Returns the canonical upper-case name used by CI hosts
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Unstable => "UNSTABLE",
            Self::Failure => "FAILURE",
            Self::NotBuilt => "NOT_BUILT",
            Self::Aborted => "ABORTED",
        }
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUCCESS" => Ok(Self::Success),
            "UNSTABLE" => Ok(Self::Unstable),
            "FAILURE" => Ok(Self::Failure),
            "NOT_BUILT" => Ok(Self::NotBuilt),
            "ABORTED" => Ok(Self::Aborted),
            other => Err(format!("unknown build result '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_result_predicates() {
        assert!(BuildResult::Success.is_success());
        assert!(!BuildResult::Unstable.is_success());
        assert!(BuildResult::Failure.is_failure());
        assert!(!BuildResult::Aborted.is_failure());
        assert!(BuildResult::Unstable.is_unstable());
    }

    #[test]
    fn test_build_result_display() {
        assert_eq!(BuildResult::Success.to_string(), "SUCCESS");
        assert_eq!(BuildResult::NotBuilt.to_string(), "NOT_BUILT");
    }

    #[test]
    fn test_build_result_from_str() {
        assert_eq!("success".parse::<BuildResult>(), Ok(BuildResult::Success));
        assert_eq!(" UNSTABLE ".parse::<BuildResult>(), Ok(BuildResult::Unstable));
        assert_eq!("not_built".parse::<BuildResult>(), Ok(BuildResult::NotBuilt));
        assert!("green".parse::<BuildResult>().is_err());
    }

    #[test]
    fn test_build_result_serde() {
        let json = serde_json::to_string(&BuildResult::NotBuilt).unwrap();
        assert_eq!(json, r#""NOT_BUILT""#);

        let result: BuildResult = serde_json::from_str(r#""FAILURE""#).unwrap();
        assert_eq!(result, BuildResult::Failure);
    }
}
