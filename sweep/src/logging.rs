//! Log output setup.
//!
//! Logs go to stderr so that reports on stdout stay clean. `RUST_LOG` takes
//! precedence over the `-v` flags.

use crate::context::VerbosityLevel;
use tracing_subscriber::EnvFilter;

/// Build the filter for a verbosity level, preferring RUST_LOG when set
pub fn filter(verbosity: VerbosityLevel) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()))
}

/// Install the global subscriber
pub fn init(verbosity: VerbosityLevel, ansi: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbosity))
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(verbosity >= VerbosityLevel::VeryVerbose)
        .try_init();
}
