//! Configuration management
//!
//! Steps are described in a YAML file:
//!
//! ```yaml
//! settings:
//!   docker_binary: docker
//!   expansion: strict
//! build:
//!   name: ghcr.io/team/app
//!   tag: ${BUILD_NUMBER}
//!   dockerfile: docker/Dockerfile
//!   no_cache: true
//! push:
//!   image: ghcr.io/team/app
//!   tag: latest, ${BUILD_NUMBER}
//!   build_trigger: SUCCESS
//! ```

use crate::docker::{BuildImageFields, PushImageConfig};
use crate::executor::ExpansionPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading a steps file
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path of the file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The file is not valid YAML for a steps file
    #[error("invalid steps file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Container engine binary
    pub docker_binary: String,
    /// Log level
    pub log_level: String,
    /// Treatment of unresolved `${VAR}` references
    pub expansion: ExpansionPolicy,
    /// Whether `${VAR}` templates may reference process environment
    /// variables; the engine process inherits the environment either way
    pub inherit_process_env: bool,
    /// Variables every build must define
    pub required_variables: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            docker_binary: "docker".to_string(),
            log_level: "info".to_string(),
            expansion: ExpansionPolicy::Lenient,
            inherit_process_env: true,
            required_variables: Vec::new(),
        }
    }
}

impl Settings {
    /// Applies `DOCKSTEP_*` overrides read through `lookup`
    ///
    /// | Variable | Setting |
    /// |----------|---------|
    /// | `DOCKSTEP_DOCKER` | `docker_binary` |
    /// | `DOCKSTEP_LOG` | `log_level` |
    /// | `DOCKSTEP_STRICT_MACROS` | `expansion` (`1`/`true` for strict) |
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(binary) = lookup("DOCKSTEP_DOCKER").filter(|b| !b.trim().is_empty()) {
            self.docker_binary = binary;
        }
        if let Some(level) = lookup("DOCKSTEP_LOG").filter(|l| !l.trim().is_empty()) {
            self.log_level = level;
        }
        if let Some(strict) = lookup("DOCKSTEP_STRICT_MACROS") {
            self.expansion = match strict.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => ExpansionPolicy::Strict,
                _ => ExpansionPolicy::Lenient,
            };
        }
        self
    }

    /// Applies overrides from the process environment
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }
}

/// Contents of a steps file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepsFile {
    /// Application settings
    pub settings: Settings,
    /// Build image step, if configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildImageFields>,
    /// Push image step, if configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push: Option<PushImageConfig>,
}

impl StepsFile {
    /// Parses a steps file from YAML
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the YAML does not describe a steps file
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads a steps file from disk
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::BuildTrigger;
    use std::collections::HashMap;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.docker_binary, "docker");
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.expansion, ExpansionPolicy::Lenient);
        assert!(settings.inherit_process_env);
    }

    #[test]
    fn test_settings_overrides() {
        let vars = HashMap::from([
            ("DOCKSTEP_DOCKER", "podman"),
            ("DOCKSTEP_STRICT_MACROS", "true"),
        ]);
        let settings = Settings::default()
            .with_overrides(|key| vars.get(key).map(ToString::to_string));

        assert_eq!(settings.docker_binary, "podman");
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.expansion, ExpansionPolicy::Strict);
    }

    #[test]
    fn test_steps_file_from_yaml() {
        let yaml = r#"
settings:
  expansion: strict
  required_variables: [REGISTRY]
build:
  name: ${REGISTRY}/app
  tag: ${BUILD_NUMBER}
  cpu_quota: 50000
  pull: true
push:
  image: ${REGISTRY}/app
  tag: latest, ${BUILD_NUMBER}
  build_trigger: SUCCESS
  alternative_docker_host: tcp://builder:2376
"#;
        let file = StepsFile::from_yaml(yaml).unwrap();

        assert_eq!(file.settings.expansion, ExpansionPolicy::Strict);
        assert_eq!(file.settings.docker_binary, "docker");
        assert_eq!(file.settings.required_variables, vec!["REGISTRY"]);

        let build = file.build.unwrap();
        assert_eq!(build.cpu_quota.as_deref(), Some("50000"));
        assert!(build.pull);

        let push = file.push.unwrap();
        assert_eq!(push.build_trigger, BuildTrigger::Success);
        assert_eq!(push.alternative_docker_host.as_deref(), Some("tcp://builder:2376"));
    }

    #[test]
    fn test_steps_file_empty() {
        let file = StepsFile::from_yaml("{}").unwrap();
        assert!(file.build.is_none());
        assert!(file.push.is_none());
    }

    #[test]
    fn test_steps_file_rejects_bad_yaml() {
        assert!(matches!(
            StepsFile::from_yaml("build: [1, 2"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = StepsFile::load(Path::new("/nonexistent/steps.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
