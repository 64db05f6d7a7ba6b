//! Logging configuration
//!
//! Initializes tracing for the application. `RUST_LOG` takes precedence
//! over the configured level.

/// Initializes logging with the specified level
///
/// Diagnostics go to standard error so they never mix with the build log.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_line_number(true)
        .try_init();
}
