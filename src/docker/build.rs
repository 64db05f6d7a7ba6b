//! Build image step
//!
//! Translates a [`BuildImageConfig`] into a `docker build` invocation:
//!
//! ```text
//! docker build [--file=PATH] [resource limits] [flags] CONTEXT --tag NAME:TAG
//! ```
//!
//! The argument list is produced by [`build_arguments`], a pure function of
//! the configuration and the values resolved against the build
//! environment. [`BuildImageStep`] resolves those values, materialises
//! inline Dockerfiles and hands the command to the executor.

use super::command::{DockerCommand, Subcommand};
use super::reference::ImageReference;
use crate::executor::{
    BuildContext, BuildLog, BuildStep, ExpansionPolicy, Launcher, TempFile, TempFileManager,
    expand,
};
use crate::pipeline::{EnvironmentError, StepError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where the Dockerfile comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockerfileSource {
    /// Path template, expanded against the build environment
    Path(String),
    /// Literal Dockerfile content, written to a temp file at build time
    Inline(String),
}

/// Raw build step fields, as persisted or entered by the user
///
/// Numeric limits are free text; unparsable values are dropped when
/// converting into a [`BuildImageConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct BuildImageFields {
    /// Image name template
    pub name: String,
    /// Tag template
    pub tag: String,
    /// Dockerfile path template
    pub dockerfile: Option<String>,
    /// Inline Dockerfile content
    pub dockerfile_content: Option<String>,
    /// Build context directory template (default `.`)
    pub context: Option<String>,
    /// CPU shares (relative weight)
    #[serde(deserialize_with = "free_text")]
    pub cpu_shares: Option<String>,
    /// CFS period in microseconds
    #[serde(deserialize_with = "free_text")]
    pub cpu_period: Option<String>,
    /// CFS quota in microseconds
    #[serde(deserialize_with = "free_text")]
    pub cpu_quota: Option<String>,
    /// CPUs the build may use, e.g. `0-3`
    #[serde(deserialize_with = "free_text")]
    pub cpu_constraint: Option<String>,
    /// Memory nodes the build may use
    #[serde(deserialize_with = "free_text")]
    pub memory_node_constraint: Option<String>,
    /// Memory limit, e.g. `2g`
    #[serde(deserialize_with = "free_text")]
    pub memory_limit: Option<String>,
    /// Memory plus swap limit
    #[serde(deserialize_with = "free_text")]
    pub memory_swap: Option<String>,
    /// Do not use the layer cache
    pub no_cache: bool,
    /// Always pull newer base images
    pub pull: bool,
    /// Skip image verification
    pub disable_content_trust: bool,
    /// Always remove intermediate containers
    pub force_remove_intermediate_containers: bool,
    /// Remove intermediate containers after a successful build
    pub remove_intermediate_containers: bool,
}

/// Accepts YAML scalars of any type for a free-text field
fn free_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(s) => s,
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Bool(b) => b.to_string(),
    }))
}

/// Resource constraints passed to the engine
///
/// String constraints use engine-specific syntax and are not validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceLimits {
    /// `--cpu-shares`
    pub cpu_shares: Option<i64>,
    /// `--cpu-period`
    pub cpu_period: Option<i64>,
    /// `--cpu-quota`
    pub cpu_quota: Option<i64>,
    /// `--cpuset-cpus`
    pub cpuset_cpus: Option<String>,
    /// `--cpuset-mems`
    pub cpuset_mems: Option<String>,
    /// `--memory`
    pub memory: Option<String>,
    /// `--memory-swap`
    pub memory_swap: Option<String>,
}

/// Switches emitted as bare flags when set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct BuildFlags {
    /// `--no-cache`
    pub no_cache: bool,
    /// `--pull`
    pub pull: bool,
    /// `--disable-content-trust`
    pub disable_content_trust: bool,
    /// `--force-rm`
    pub force_remove_intermediate_containers: bool,
    /// `--rm`
    pub remove_intermediate_containers: bool,
}

/// Immutable configuration of a build image step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildImageConfig {
    /// Image name template
    pub name: String,
    /// Tag template
    pub tag: String,
    /// Dockerfile source; `None` leaves the engine default
    pub dockerfile: Option<DockerfileSource>,
    /// Build context directory template
    pub context: String,
    /// Resource constraints
    pub resources: ResourceLimits,
    /// Boolean switches
    pub flags: BuildFlags,
}

impl BuildImageConfig {
    /// Creates a configuration with no options set
    #[must_use]
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            dockerfile: None,
            context: ".".to_string(),
            resources: ResourceLimits::default(),
            flags: BuildFlags::default(),
        }
    }
}

impl From<BuildImageFields> for BuildImageConfig {
    fn from(fields: BuildImageFields) -> Self {
        let path = non_blank(fields.dockerfile);
        let content = fields.dockerfile_content.filter(|c| !c.trim().is_empty());

        let dockerfile = match (path, content) {
            (Some(path), Some(_)) => {
                tracing::warn!(
                    dockerfile = %path,
                    "Both a Dockerfile path and inline content are set; using the path"
                );
                Some(DockerfileSource::Path(path))
            }
            (Some(path), None) => Some(DockerfileSource::Path(path)),
            (None, Some(content)) => Some(DockerfileSource::Inline(content)),
            (None, None) => None,
        };

        Self {
            name: fields.name,
            tag: fields.tag,
            dockerfile,
            context: non_blank(fields.context).unwrap_or_else(|| ".".to_string()),
            resources: ResourceLimits {
                cpu_shares: parse_number(fields.cpu_shares.as_deref()),
                cpu_period: parse_number(fields.cpu_period.as_deref()),
                cpu_quota: parse_number(fields.cpu_quota.as_deref()),
                cpuset_cpus: non_blank(fields.cpu_constraint),
                cpuset_mems: non_blank(fields.memory_node_constraint),
                memory: non_blank(fields.memory_limit),
                memory_swap: non_blank(fields.memory_swap),
            },
            flags: BuildFlags {
                no_cache: fields.no_cache,
                pull: fields.pull,
                disable_content_trust: fields.disable_content_trust,
                force_remove_intermediate_containers: fields.force_remove_intermediate_containers,
                remove_intermediate_containers: fields.remove_intermediate_containers,
            },
        }
    }
}

/// Parses a free-text integer field; blank or malformed text is `None`
#[must_use]
pub fn parse_number(text: Option<&str>) -> Option<i64> {
    text.and_then(|t| t.trim().parse().ok())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Build values after macro expansion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBuild {
    /// Final image reference
    pub reference: ImageReference,
    /// Dockerfile path handed to `--file`
    pub dockerfile: Option<String>,
    /// Build context directory
    pub context: String,
}

impl ResolvedBuild {
    /// Expands `config`'s templates against `env`
    ///
    /// Inline Dockerfile content is not expanded; `dockerfile` stays `None`
    /// until the content has been written out.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentError::UnresolvedVariable`] under strict
    /// expansion.
    pub fn resolve(
        config: &BuildImageConfig,
        env: &HashMap<String, String>,
        policy: ExpansionPolicy,
    ) -> Result<Self, EnvironmentError> {
        let name = expand(&config.name, env, policy)?;
        let tag = expand(&config.tag, env, policy)?;
        let dockerfile = match &config.dockerfile {
            Some(DockerfileSource::Path(path)) => Some(expand(path, env, policy)?),
            Some(DockerfileSource::Inline(_)) | None => None,
        };

        Ok(Self {
            reference: ImageReference::compose(&name, &tag),
            dockerfile,
            context: expand(&config.context, env, policy)?,
        })
    }
}

/// Builds the `docker build` argument list
///
/// The image reference is always the final argument.
#[must_use]
pub fn build_arguments(config: &BuildImageConfig, resolved: &ResolvedBuild) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(path) = &resolved.dockerfile {
        args.push(format!("--file={path}"));
    }

    let numeric = [
        ("--cpu-shares", config.resources.cpu_shares),
        ("--cpu-period", config.resources.cpu_period),
        ("--cpu-quota", config.resources.cpu_quota),
    ];
    for (flag, value) in numeric {
        if let Some(value) = value {
            args.push(format!("{flag}={value}"));
        }
    }

    let text = [
        ("--cpuset-cpus", &config.resources.cpuset_cpus),
        ("--cpuset-mems", &config.resources.cpuset_mems),
        ("--memory", &config.resources.memory),
        ("--memory-swap", &config.resources.memory_swap),
    ];
    for (flag, value) in text {
        if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            args.push(format!("{flag}={value}"));
        }
    }

    let flags = [
        ("--no-cache", config.flags.no_cache),
        ("--pull", config.flags.pull),
        ("--disable-content-trust", config.flags.disable_content_trust),
        ("--force-rm", config.flags.force_remove_intermediate_containers),
        ("--rm", config.flags.remove_intermediate_containers),
    ];
    args.extend(
        flags
            .into_iter()
            .filter(|(_, enabled)| *enabled)
            .map(|(flag, _)| flag.to_string()),
    );

    args.push(resolved.context.clone());
    args.push("--tag".to_string());
    args.push(resolved.reference.to_string());
    args
}

/// Step that builds an image from a Dockerfile
#[derive(Debug, Clone)]
pub struct BuildImageStep {
    config: BuildImageConfig,
}

impl BuildImageStep {
    /// Creates the step
    #[must_use]
    pub fn new(config: BuildImageConfig) -> Self {
        Self { config }
    }

    /// Returns the step's configuration
    #[must_use]
    pub fn config(&self) -> &BuildImageConfig {
        &self.config
    }

    fn run(
        &self,
        build: &BuildContext,
        launcher: &Launcher<'_>,
        log: &mut dyn BuildLog,
    ) -> Result<bool, StepError> {
        let env = launcher.resolver.resolve(build, log)?;
        let mut resolved = ResolvedBuild::resolve(&self.config, &env, launcher.expansion)?;

        // Kept alive until the engine returns.
        let mut inline_dockerfile: Option<TempFile> = None;
        if let Some(DockerfileSource::Inline(content)) = &self.config.dockerfile {
            let manager = TempFileManager::new(
                &build.workspace,
                &build.job_name,
                &build.build_number.to_string(),
            )?;
            let file = manager.write("Dockerfile", content)?;
            resolved.dockerfile = Some(file.path().to_string_lossy().to_string());
            inline_dockerfile = Some(file);
        }

        let args = build_arguments(&self.config, &resolved);
        tracing::info!(image = %resolved.reference, "Building image");
        log.println(&format!("Building \"{}\"", resolved.reference));

        let command = DockerCommand::new(Subcommand::Build, args, env);
        let succeeded = launcher.executor.execute(&command, build, log);
        drop(inline_dockerfile);

        Ok(succeeded)
    }
}

impl BuildStep for BuildImageStep {
    fn perform(
        &self,
        build: &BuildContext,
        launcher: &Launcher<'_>,
        log: &mut dyn BuildLog,
    ) -> bool {
        match self.run(build, launcher, log) {
            Ok(succeeded) => succeeded,
            Err(e) => {
                tracing::error!(job = %build.job_name, error = %e, "Build step aborted");
                log.fatal_error(&format!("Error: {e}"));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{
        CommandExecutor, DryRunExecutor, EnvironmentResolver, HostEnvironment, MemoryLog,
    };
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use tempfile::TempDir;

    fn resolved(reference: &str) -> ResolvedBuild {
        ResolvedBuild {
            reference: ImageReference::compose(reference, "latest"),
            dockerfile: None,
            context: ".".to_string(),
        }
    }

    struct FailingResolver;

    impl EnvironmentResolver for FailingResolver {
        fn resolve(
            &self,
            _build: &BuildContext,
            _log: &mut dyn BuildLog,
        ) -> Result<HashMap<String, String>, EnvironmentError> {
            Err(EnvironmentError::MissingVariable {
                name: "WORKSPACE".to_string(),
            })
        }
    }

    /// Records each command and whether its `--file` existed at execution
    #[derive(Default)]
    struct FileCheckingExecutor {
        seen: RefCell<Vec<(DockerCommand, bool)>>,
    }

    impl CommandExecutor for FileCheckingExecutor {
        fn execute(
            &self,
            command: &DockerCommand,
            _build: &BuildContext,
            _log: &mut dyn BuildLog,
        ) -> bool {
            let exists = command
                .args()
                .iter()
                .find_map(|a| a.strip_prefix("--file="))
                .is_some_and(|path| std::path::Path::new(path).exists());
            self.seen.borrow_mut().push((command.clone(), exists));
            false
        }
    }

    #[test]
    fn test_minimal_arguments() {
        let config = BuildImageConfig::new("app", "latest");
        assert_eq!(
            build_arguments(&config, &resolved("app")),
            vec![".", "--tag", "app:latest"]
        );
    }

    #[test]
    fn test_all_options_in_fixed_order() {
        let fields = BuildImageFields {
            name: "App".to_string(),
            tag: "V1".to_string(),
            dockerfile: Some("docker/Dockerfile".to_string()),
            cpu_shares: Some("512".to_string()),
            cpu_period: Some("100000".to_string()),
            cpu_quota: Some("50000".to_string()),
            cpu_constraint: Some("0-3".to_string()),
            memory_node_constraint: Some("0,1".to_string()),
            memory_limit: Some("2g".to_string()),
            memory_swap: Some("-1".to_string()),
            no_cache: true,
            pull: true,
            disable_content_trust: true,
            force_remove_intermediate_containers: true,
            remove_intermediate_containers: true,
            ..Default::default()
        };
        let config = BuildImageConfig::from(fields);
        let resolved =
            ResolvedBuild::resolve(&config, &HashMap::new(), ExpansionPolicy::Lenient).unwrap();

        assert_eq!(
            build_arguments(&config, &resolved),
            vec![
                "--file=docker/Dockerfile",
                "--cpu-shares=512",
                "--cpu-period=100000",
                "--cpu-quota=50000",
                "--cpuset-cpus=0-3",
                "--cpuset-mems=0,1",
                "--memory=2g",
                "--memory-swap=-1",
                "--no-cache",
                "--pull",
                "--disable-content-trust",
                "--force-rm",
                "--rm",
                ".",
                "--tag",
                "app:v1",
            ]
        );
    }

    #[test]
    fn test_unparsable_numbers_are_dropped() {
        let fields = BuildImageFields {
            cpu_shares: Some("lots".to_string()),
            cpu_period: Some(" 2500 ".to_string()),
            cpu_quota: Some(String::new()),
            ..Default::default()
        };
        let config = BuildImageConfig::from(fields);

        assert_eq!(config.resources.cpu_shares, None);
        assert_eq!(config.resources.cpu_period, Some(2500));
        assert_eq!(config.resources.cpu_quota, None);
    }

    #[test]
    fn test_blank_string_constraints_are_omitted() {
        let mut config = BuildImageConfig::new("app", "latest");
        config.resources.memory = Some("   ".to_string());
        config.resources.cpuset_cpus = Some(String::new());

        let args = build_arguments(&config, &resolved("app"));

        assert!(!args.iter().any(|a| a.starts_with("--memory")));
        assert!(!args.iter().any(|a| a.starts_with("--cpuset-cpus")));
    }

    #[test]
    fn test_templates_expand_before_lowercasing() {
        let mut config = BuildImageConfig::new("${REGISTRY}/app", "${BRANCH}-${BUILD_NUMBER}");
        config.dockerfile = Some(DockerfileSource::Path("${WORKSPACE}/Dockerfile".to_string()));
        let env = HashMap::from([
            ("REGISTRY".to_string(), "GHCR.io/Team".to_string()),
            ("BRANCH".to_string(), "Feature".to_string()),
            ("BUILD_NUMBER".to_string(), "9".to_string()),
            ("WORKSPACE".to_string(), "/ws/App".to_string()),
        ]);

        let resolved = ResolvedBuild::resolve(&config, &env, ExpansionPolicy::Lenient).unwrap();

        assert_eq!(resolved.reference.as_str(), "ghcr.io/team/app:feature-9");
        assert_eq!(resolved.dockerfile.as_deref(), Some("/ws/App/Dockerfile"));
    }

    #[test]
    fn test_strict_expansion_rejects_unknown_variable() {
        let config = BuildImageConfig::new("app", "${GIT_TAG}");
        let err = ResolvedBuild::resolve(&config, &HashMap::new(), ExpansionPolicy::Strict)
            .unwrap_err();
        assert!(matches!(err, EnvironmentError::UnresolvedVariable { .. }));
    }

    #[test]
    fn test_path_wins_over_inline_content() {
        let config = BuildImageConfig::from(BuildImageFields {
            dockerfile: Some("Dockerfile.ci".to_string()),
            dockerfile_content: Some("FROM alpine".to_string()),
            ..Default::default()
        });
        assert_eq!(
            config.dockerfile,
            Some(DockerfileSource::Path("Dockerfile.ci".to_string()))
        );
    }

    #[test]
    fn test_inline_content_used_without_path() {
        let config = BuildImageConfig::from(BuildImageFields {
            dockerfile: Some("  ".to_string()),
            dockerfile_content: Some("FROM alpine".to_string()),
            ..Default::default()
        });
        assert_eq!(
            config.dockerfile,
            Some(DockerfileSource::Inline("FROM alpine".to_string()))
        );
    }

    #[test]
    fn test_fields_deserialize_numbers_as_text() {
        let yaml = r#"
name: app
tag: "1.0"
cpu_shares: 512
memory_limit: 1g
no_cache: true
"#;
        let fields: BuildImageFields = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(fields.cpu_shares.as_deref(), Some("512"));
        assert_eq!(fields.memory_limit.as_deref(), Some("1g"));
        assert!(fields.no_cache);
        assert!(!fields.pull);
        assert_eq!(fields.cpu_period, None);
    }

    #[test]
    fn test_step_runs_build_once() {
        let workspace = TempDir::new().unwrap();
        let build = BuildContext::new("web", 12).with_workspace(workspace.path());
        let executor = DryRunExecutor::new("docker");
        let resolver = HostEnvironment::new().inherit_process_env(false);
        let launcher = Launcher::new(&executor, &resolver);
        let mut log = MemoryLog::new();

        let step = BuildImageStep::new(BuildImageConfig::new("${JOB_NAME}", "${BUILD_NUMBER}"));

        assert!(step.perform(&build, &launcher, &mut log));

        let history = executor.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].subcommand(), Subcommand::Build);
        assert_eq!(history[0].args(), [".", "--tag", "web:12"]);
        assert_eq!(history[0].env().get("JOB_NAME").unwrap(), "web");
        assert!(log.contains("Building \"web:12\""));
    }

    #[test]
    fn test_step_propagates_engine_failure() {
        let workspace = TempDir::new().unwrap();
        let build = BuildContext::new("web", 1).with_workspace(workspace.path());
        let executor = FileCheckingExecutor::default();
        let resolver = HostEnvironment::new().inherit_process_env(false);
        let launcher = Launcher::new(&executor, &resolver);

        let step = BuildImageStep::new(BuildImageConfig::new("app", "latest"));

        assert!(!step.perform(&build, &launcher, &mut MemoryLog::new()));
        assert_eq!(executor.seen.borrow().len(), 1);
    }

    #[test]
    fn test_step_writes_inline_dockerfile_for_the_build_only() {
        let workspace = TempDir::new().unwrap();
        let build = BuildContext::new("web", 1).with_workspace(workspace.path());
        let executor = FileCheckingExecutor::default();
        let resolver = HostEnvironment::new().inherit_process_env(false);
        let launcher = Launcher::new(&executor, &resolver);

        let mut config = BuildImageConfig::new("app", "latest");
        config.dockerfile = Some(DockerfileSource::Inline("FROM alpine\n".to_string()));
        let step = BuildImageStep::new(config);

        step.perform(&build, &launcher, &mut MemoryLog::new());

        let seen = executor.seen.borrow();
        let (command, existed) = &seen[0];
        assert!(*existed);
        let path = command.args()[0].strip_prefix("--file=").unwrap();
        assert!(path.starts_with(&*workspace.path().join("@tmp").to_string_lossy()));
        assert!(!std::path::Path::new(path).exists());
    }

    #[test]
    fn test_step_reports_environment_failure() {
        let build = BuildContext::new("web", 1);
        let executor = DryRunExecutor::new("docker");
        let launcher = Launcher::new(&executor, &FailingResolver);
        let mut log = MemoryLog::new();

        let step = BuildImageStep::new(BuildImageConfig::new("app", "latest"));

        assert!(!step.perform(&build, &launcher, &mut log));
        assert!(executor.history().is_empty());
        assert!(log.contains("FATAL: Error: required variable 'WORKSPACE' is not set"));
    }
}
