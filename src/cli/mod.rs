//! CLI for dockstep
//!
//! - `build`: Build an image as described by a steps file
//! - `push`: Push an image for a finished build
//! - `completions`: Generate shell completions

pub mod completions;

use anyhow::{Context, Result, bail};
use clap::{Args as ClapArgs, CommandFactory, Parser, Subcommand, ValueEnum};
use dockstep::docker::{BuildImageConfig, BuildImageStep, PushImageStep};
use dockstep::executor::{
    BuildContext, BuildLog, BuildStep, CommandExecutor, ConsoleLog, DryRunExecutor,
    HostEnvironment, Launcher, ProcessExecutor,
};
use dockstep::infrastructure::{Settings, StepsFile, init_logging};
use dockstep::pipeline::BuildResult;
use std::path::{Path, PathBuf};

/// CLI arguments for dockstep
#[derive(Parser, Debug)]
#[command(name = "dockstep")]
#[command(author, version, about = "Docker build and push steps for CI builds", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the image described in the steps file
    Build {
        #[command(flatten)]
        common: StepArgs,
    },

    /// Push the image described in the steps file
    Push {
        #[command(flatten)]
        common: StepArgs,
        /// Result of the build the push belongs to
        #[arg(short, long)]
        result: BuildResult,
    },

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: ShellArg,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Options shared by the build and push commands
#[derive(ClapArgs, Debug)]
struct StepArgs {
    /// Steps file
    #[arg(short, long)]
    config: PathBuf,
    /// Workspace directory (current directory if not specified)
    #[arg(short, long)]
    workspace: Option<PathBuf>,
    /// Job name (defaults to the steps file name)
    #[arg(short, long)]
    job: Option<String>,
    /// Build number
    #[arg(short, long, default_value_t = 1)]
    build_number: u64,
    /// Build variable, as KEY=VALUE
    #[arg(short = 'e', long = "env", value_parser = parse_variable)]
    variables: Vec<(String, String)>,
    /// Print the engine commands instead of running them
    #[arg(long)]
    dry_run: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ShellArg {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

fn parse_variable(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

fn job_name(common: &StepArgs) -> String {
    common.job.clone().unwrap_or_else(|| {
        common
            .config
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("job")
            .to_string()
    })
}

fn build_context(common: &StepArgs) -> Result<BuildContext> {
    let workspace = match &common.workspace {
        Some(path) => path.clone(),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    let mut build = BuildContext::new(job_name(common), common.build_number).with_workspace(workspace);
    for (key, value) in &common.variables {
        build.set_variable(key, value);
    }
    Ok(build)
}

fn load_steps(path: &Path) -> Result<StepsFile> {
    let mut steps = StepsFile::load(path)
        .with_context(|| format!("Failed to load steps file: {}", path.display()))?;
    steps.settings = steps.settings.with_env_overrides();
    Ok(steps)
}

/// Runs `step` with the engine selected by the settings
fn perform(
    step: &dyn BuildStep,
    build: &BuildContext,
    settings: &Settings,
    dry_run: bool,
) -> bool {
    let resolver = HostEnvironment::new()
        .inherit_process_env(settings.inherit_process_env)
        .require(settings.required_variables.iter().cloned());

    let executor: Box<dyn CommandExecutor> = if dry_run {
        Box::new(DryRunExecutor::new(settings.docker_binary.clone()))
    } else {
        Box::new(ProcessExecutor::new(settings.docker_binary.clone()))
    };

    let launcher = Launcher::new(executor.as_ref(), &resolver).with_expansion(settings.expansion);
    let mut log = ConsoleLog;
    let log: &mut dyn BuildLog = &mut log;

    tracing::debug!(
        job = %build.job_name,
        build_number = build.build_number,
        binary = %settings.docker_binary,
        dry_run,
        "Running step"
    );
    step.perform(build, &launcher, log)
}

/// Build the CLI command for completion generation
pub fn build_cli() -> clap::Command {
    Args::command()
}

/// Parse and execute CLI arguments
///
/// Returns whether the step succeeded.
pub fn run() -> Result<bool> {
    let args = Args::parse();

    match args.command {
        Command::Build { common } => {
            let steps = load_steps(&common.config)?;
            init_logging(&steps.settings.log_level);

            let Some(fields) = steps.build else {
                bail!("No build step in {}", common.config.display());
            };
            let step = BuildImageStep::new(BuildImageConfig::from(fields));
            let build = build_context(&common)?;

            Ok(perform(&step, &build, &steps.settings, common.dry_run))
        }
        Command::Push { common, result } => {
            let steps = load_steps(&common.config)?;
            init_logging(&steps.settings.log_level);

            let Some(config) = steps.push else {
                bail!("No push step in {}", common.config.display());
            };
            let step = PushImageStep::new(config);
            let build = build_context(&common)?.with_result(result);

            Ok(perform(&step, &build, &steps.settings, common.dry_run))
        }
        Command::Completions { shell, output } => {
            use clap_complete::Shell;

            let shell_enum = match shell {
                ShellArg::Bash => Shell::Bash,
                ShellArg::Zsh => Shell::Zsh,
                ShellArg::Fish => Shell::Fish,
                ShellArg::PowerShell => Shell::PowerShell,
            };

            let completions = completions::generate_completions(shell_enum)?;

            if let Some(output_path) = output {
                completions::save_completions(&completions, &output_path)?;
            } else {
                println!("{}", completions);
            }
            Ok(true)
        }
    }
}
