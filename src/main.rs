//! dockstep - Docker build and push steps for CI builds
//!
//! ## Commands
//!
//! - `dockstep build` - Build the image described in a steps file
//! - `dockstep push` - Push the image for a finished build
//! - `dockstep completions` - Generate shell completions
//!
//! ## Quick Start
//!
//! ```bash
//! # Build image #42 of the "api" job
//! dockstep build -c steps.yaml --job api --build-number 42
//!
//! # Push it if the build succeeded
//! dockstep push -c steps.yaml --job api --build-number 42 --result SUCCESS
//!
//! # See the engine commands without running them
//! dockstep build -c steps.yaml --dry-run
//!
//! # Generate shell completions
//! dockstep completions bash > /etc/bash_completion.d/dockstep
//! ```
//!
//! The exit code is zero only when the step succeeds.

use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    match cli::run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            if std::env::var("DOCKSTEP_VERBOSE").is_ok() {
                eprintln!("{e:?}");
            }
            ExitCode::FAILURE
        }
    }
}
