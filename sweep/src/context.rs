//! Application context that holds resolved configuration
//!
//! The context is built following the precedence order:
//! 1. Default values
//! 2. Config file values
//! 3. Environment variables
//! 4. CLI flags
//!
//! Once built, the context is passed as read-only throughout the application.

use crate::config;
use crate::format::{ColorChoice, OutputFormat};
use libsweep::Config;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the color choice
pub const COLOR_ENV: &str = "SWEEP_COLOR";

/// How chatty the log output on stderr is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerbosityLevel {
    /// Warnings and errors only
    Normal,
    /// `-v`
    Verbose,
    /// `-vv`
    VeryVerbose,
    /// `-vvv` and beyond
    Trace,
}

impl VerbosityLevel {
    /// Map the number of `-v` flags to a level
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => VerbosityLevel::Normal,
            1 => VerbosityLevel::Verbose,
            2 => VerbosityLevel::VeryVerbose,
            _ => VerbosityLevel::Trace,
        }
    }

    /// The tracing filter directive used when RUST_LOG is not set
    pub fn filter_directive(self) -> &'static str {
        match self {
            VerbosityLevel::Normal => "warn",
            VerbosityLevel::Verbose => "info",
            VerbosityLevel::VeryVerbose => "debug",
            VerbosityLevel::Trace => "trace",
        }
    }
}

/// Application context with resolved configuration and runtime state
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Resolved configuration
    pub config: Config,
    /// Resolved color choice
    pub color: ColorChoice,
    /// Default output format, overridable per command
    pub format: OutputFormat,
    /// Verbosity from `-v` flags
    pub verbosity: VerbosityLevel,
    /// Where stored registry credentials live
    pub credentials_path: PathBuf,
}

impl AppContext {
    /// Build context with precedence: defaults > config file > env vars > CLI flags
    pub fn build(
        cli_config: Option<&Path>,
        cli_color: Option<ColorChoice>,
        verbosity: VerbosityLevel,
    ) -> Result<Self, String> {
        Self::build_with(cli_config, cli_color, verbosity, |key| env::var(key).ok())
    }

    pub(crate) fn build_with(
        cli_config: Option<&Path>,
        cli_color: Option<ColorChoice>,
        verbosity: VerbosityLevel,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, String> {
        // 1 + 2. Defaults merged under the config file. A file named by the
        // flag or the environment must exist; the default location may not.
        let explicit = cli_config.map(Path::to_path_buf).or_else(|| {
            lookup(config::CONFIG_ENV)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
        });
        let config = match explicit {
            Some(path) => Config::load(Some(&path)),
            None => {
                let path = config::config_path_with(&lookup);
                if path.is_file() {
                    Config::load(Some(&path))
                } else {
                    Config::load(None)
                }
            }
        }
        .map_err(|e| e.to_string())?;

        let mut color = ColorChoice::from(config.output.color);
        let format = OutputFormat::from(config.output.format);

        // 3. Environment overrides
        if let Some(value) = lookup(COLOR_ENV) {
            color = ColorChoice::from(value.as_str());
        }

        // 4. CLI flags (highest priority)
        if let Some(cli_color) = cli_color {
            color = cli_color;
        }

        Ok(Self {
            credentials_path: config::credentials_path_with(&lookup),
            config,
            color,
            format,
            verbosity,
        })
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
