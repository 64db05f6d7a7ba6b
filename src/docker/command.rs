//! Engine command lines

use std::collections::HashMap;
use std::fmt;

/// Engine subcommand a step invokes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subcommand {
    /// `docker build`
    Build,
    /// `docker push`
    Push,
}

impl fmt::Display for Subcommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subcommand::Build => write!(f, "build"),
            Subcommand::Push => write!(f, "push"),
        }
    }
}

/// One invocation of the container engine
///
/// Owns its argument list; nothing mutates it after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerCommand {
    host: Option<String>,
    subcommand: Subcommand,
    args: Vec<String>,
    env: HashMap<String, String>,
}

impl DockerCommand {
    /// Creates a command against the default daemon
    #[must_use]
    pub fn new(subcommand: Subcommand, args: Vec<String>, env: HashMap<String, String>) -> Self {
        Self {
            host: None,
            subcommand,
            args,
            env,
        }
    }

    /// Targets an alternative daemon; blank hosts are ignored
    #[must_use]
    pub fn with_host(mut self, host: Option<&str>) -> Self {
        self.host = host
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(ToString::to_string);
        self
    }

    /// Returns the alternative daemon host, if any
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Returns the subcommand
    #[must_use]
    pub fn subcommand(&self) -> Subcommand {
        self.subcommand
    }

    /// Returns the subcommand's arguments
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the environment the engine runs with
    #[must_use]
    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }

    /// Returns every argument passed to the engine binary
    #[must_use]
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 2);
        if let Some(host) = &self.host {
            argv.push(format!("--host={host}"));
        }
        argv.push(self.subcommand.to_string());
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// Renders the shell-quoted command line for `binary`
    #[must_use]
    pub fn command_line(&self, binary: &str) -> String {
        let mut words = vec![binary.to_string()];
        words.extend(self.argv());
        shell_words::join(words)
    }
}
