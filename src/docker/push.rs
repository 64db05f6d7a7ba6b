//! Push image step
//!
//! Pushes one image under every tag of a comma-separated list, after the
//! upstream build finished with an outcome the step's trigger accepts.
//! Tags are pushed in order and the loop stops at the first failure, so a
//! failed push never leaves later tags published.

use super::command::{DockerCommand, Subcommand};
use super::reference::ImageReference;
use crate::executor::{BuildContext, BuildLog, BuildStep, Launcher, expand};
use crate::pipeline::{BuildTrigger, StepError};
use serde::{Deserialize, Serialize};

/// Immutable configuration of a push image step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushImageConfig {
    /// Image name template
    ///
    /// Expanded like the tags, and the composed `image:tag` reference is
    /// lower-cased as a whole, the same way the build step names images.
    pub image: String,

    /// Comma-separated tag list template
    pub tag: String,

    /// Upstream outcome that triggers the push
    pub build_trigger: BuildTrigger,

    /// Alternative daemon to push through
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative_docker_host: Option<String>,

    /// Skip image signing
    pub disable_content_trust: bool,

    /// Persisted for configuration compatibility; execution ignores it.
    pub fail: bool,
}

impl PushImageConfig {
    /// Creates a configuration triggered by a successful build
    #[must_use]
    pub fn new(image: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Sets the trigger mode
    #[must_use]
    pub fn with_trigger(mut self, trigger: impl Into<BuildTrigger>) -> Self {
        self.build_trigger = trigger.into();
        self
    }

    /// Sets the alternative daemon host
    #[must_use]
    pub fn with_docker_host(mut self, host: impl Into<String>) -> Self {
        self.alternative_docker_host = Some(host.into());
        self
    }

    /// Sets the content trust switch
    #[must_use]
    pub fn with_disable_content_trust(mut self, disable: bool) -> Self {
        self.disable_content_trust = disable;
        self
    }
}

/// Splits an expanded tag list into individual tags
///
/// Tags are trimmed and lower-cased. Empty segments at the end of the list
/// are dropped; empty segments between tags are kept so the engine rejects
/// the malformed reference and the push stops there. A list with no tags
/// still yields one empty tag.
#[must_use]
pub fn parse_tags(expanded: &str) -> Vec<String> {
    let mut segments: Vec<&str> = expanded.split(',').collect();
    while segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }

    if segments.is_empty() {
        return vec![String::new()];
    }
    segments
        .into_iter()
        .map(|t| t.trim().to_lowercase())
        .collect()
}

/// Builds the `docker push` argument list for one reference
#[must_use]
pub fn push_arguments(reference: &ImageReference, disable_content_trust: bool) -> Vec<String> {
    let mut args = Vec::with_capacity(2);
    if disable_content_trust {
        args.push("--disable-content-trust".to_string());
    }
    args.push(reference.to_string());
    args
}

/// Step that pushes a built image to its registry
#[derive(Debug, Clone)]
pub struct PushImageStep {
    config: PushImageConfig,
}

impl PushImageStep {
    /// Creates the step
    #[must_use]
    pub fn new(config: PushImageConfig) -> Self {
        Self { config }
    }

    /// Returns the step's configuration
    #[must_use]
    pub fn config(&self) -> &PushImageConfig {
        &self.config
    }

    fn run(
        &self,
        build: &BuildContext,
        launcher: &Launcher<'_>,
        log: &mut dyn BuildLog,
    ) -> Result<bool, StepError> {
        let env = launcher.resolver.resolve(build, log)?;
        let image = expand(&self.config.image, &env, launcher.expansion)?;
        let tags = parse_tags(&expand(&self.config.tag, &env, launcher.expansion)?);

        let mut result = false;
        for tag in &tags {
            let reference = ImageReference::compose(&image, tag);
            let args = push_arguments(&reference, self.config.disable_content_trust);

            tracing::info!(image = %reference, "Pushing image");
            log.println(&format!("Pushing \"{reference}\""));

            let command = DockerCommand::new(Subcommand::Push, args, env.clone())
                .with_host(self.config.alternative_docker_host.as_deref());
            result = launcher.executor.execute(&command, build, log);

            if !result {
                tracing::warn!(image = %reference, "Push failed, skipping remaining tags");
                break;
            }
        }

        Ok(result)
    }
}

impl BuildStep for PushImageStep {
    fn perform(
        &self,
        build: &BuildContext,
        launcher: &Launcher<'_>,
        log: &mut dyn BuildLog,
    ) -> bool {
        let trigger = &self.config.build_trigger;

        if !trigger.should_run(build.result) {
            if trigger.is_recognised() {
                tracing::info!(
                    trigger = %trigger,
                    result = ?build.result,
                    "Build result does not match trigger, skipping push"
                );
            } else {
                tracing::warn!(trigger = %trigger, "Unknown build trigger, skipping push");
            }
            return true;
        }

        match self.run(build, launcher, log) {
            Ok(succeeded) => succeeded,
            Err(e) => {
                tracing::error!(job = %build.job_name, error = %e, "Push step aborted");
                log.fatal_error(&format!("Error: {e}"));
                false
            }
        }
    }
}
