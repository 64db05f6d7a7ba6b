//! Engine process execution
//!
//! [`ProcessExecutor`] runs the container engine as a child process of the
//! build. Standard output and standard error share one pipe so the build
//! log keeps the engine's own interleaving.

use super::traits::{BuildContext, BuildLog, CommandExecutor};
use crate::docker::DockerCommand;
use parking_lot::Mutex;
use std::io::{self, BufRead, BufReader};
use std::process::{Command, ExitStatus, Stdio};

/// Executor that spawns the engine binary
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    binary: String,
}

impl ProcessExecutor {
    /// Creates an executor for the given engine binary
    #[must_use]
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Returns the engine binary
    #[must_use]
    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn run(
        &self,
        command: &DockerCommand,
        build: &BuildContext,
        log: &mut dyn BuildLog,
    ) -> io::Result<ExitStatus> {
        let (reader, writer) = os_pipe::pipe()?;
        let writer_clone = writer.try_clone()?;

        let mut cmd = Command::new(&self.binary);
        cmd.args(command.argv());
        cmd.envs(command.env());
        cmd.current_dir(&build.workspace);
        cmd.stdin(Stdio::null());
        cmd.stdout(writer);
        cmd.stderr(writer_clone);

        let mut child = cmd.spawn()?;
        // The pipe only reaches EOF once every writer is closed.
        drop(cmd);

        // Engine output is not guaranteed to be UTF-8.
        for line in BufReader::new(reader).split(b'\n') {
            match line {
                Ok(bytes) => {
                    let text = String::from_utf8_lossy(&bytes);
                    log.println(text.trim_end_matches('\r'));
                }
                Err(e) => {
                    tracing::warn!(binary = %self.binary, error = %e, "Lost engine output");
                    break;
                }
            }
        }

        child.wait()
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl CommandExecutor for ProcessExecutor {
    fn execute(
        &self,
        command: &DockerCommand,
        build: &BuildContext,
        log: &mut dyn BuildLog,
    ) -> bool {
        let command_line = command.command_line(&self.binary);
        log.println(&format!("$ {command_line}"));
        tracing::debug!(command = %command_line, workspace = %build.workspace.display(), "Executing engine command");

        match self.run(command, build, log) {
            Ok(status) if status.success() => true,
            Ok(status) => {
                let code = status.code().unwrap_or(-1);
                tracing::warn!(subcommand = %command.subcommand(), code, "Engine command failed");
                false
            }
            Err(e) => {
                log.println(&format!("Failed to run {}: {e}", self.binary));
                tracing::error!(binary = %self.binary, error = %e, "Could not launch engine");
                false
            }
        }
    }
}

/// Executor that only logs and records the commands it is given
#[derive(Debug)]
pub struct DryRunExecutor {
    binary: String,
    history: Mutex<Vec<DockerCommand>>,
}

impl DryRunExecutor {
    /// Creates a dry-run executor rendering commands for `binary`
    #[must_use]
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Returns the commands seen so far
    #[must_use]
    pub fn history(&self) -> Vec<DockerCommand> {
        self.history.lock().clone()
    }
}

impl CommandExecutor for DryRunExecutor {
    fn execute(
        &self,
        command: &DockerCommand,
        _build: &BuildContext,
        log: &mut dyn BuildLog,
    ) -> bool {
        log.println(&format!("[dry-run] {}", command.command_line(&self.binary)));
        self.history.lock().push(command.clone());
        true
    }
}
