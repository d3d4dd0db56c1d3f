//! Application configuration.
//!
//! This module manages application configuration with sensible defaults,
//! loading from a YAML file. Every section is optional; missing keys keep
//! their default values.
//!
//! ```yaml
//! output:
//!   format: pretty
//!   color: auto
//! network:
//!   timeout: 30
//!   max_idle_per_host: 10
//! clean:
//!   grace: 720h
//!   keep: 5
//!   allow_tagged: false
//!   recursive: true
//!   concurrency: 20
//! ```

use crate::cleaner::DEFAULT_CONCURRENCY;
use crate::client::ClientConfig;
use crate::error::{Result, SweepError};
use config::{Config as ConfigRs, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[cfg(test)]
mod tests;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub network: Network,
    #[serde(default)]
    pub clean: Clean,
}

impl Config {
    /// Parses a `Config` from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let builder = Self::defaults()?.add_source(File::from_str(s, FileFormat::Yaml));

        Self::from_builder(builder, None)
    }

    /// Loads a `Config` from an optional file path.
    ///
    /// Without a path the defaults are returned. A given path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Self::defaults()?;

        if let Some(p) = path {
            builder = builder.add_source(File::from(p).format(FileFormat::Yaml).required(true));
        }

        Self::from_builder(builder, path)
    }

    /// HTTP client settings derived from the network section.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new()
            .with_timeout(self.network.timeout)
            .with_max_idle_per_host(self.network.max_idle_per_host)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let defaults = ConfigRs::try_from(&Config::default()).map_err(|e| {
            SweepError::config_with_source("Failed to build default configuration", None, e)
        })?;
        Ok(ConfigRs::builder().add_source(defaults))
    }

    /// Creates a `Config` from a `config::ConfigBuilder`.
    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        path: Option<&Path>,
    ) -> Result<Self> {
        let config: Config = builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| {
                SweepError::config_with_source(
                    "Failed to deserialize configuration".to_string(),
                    path.map(|p| p.display().to_string()),
                    e,
                )
            })?;

        // Reject a bad grace period at load time rather than at first use.
        config.clean.grace_duration()?;
        Ok(config)
    }
}

/// Output formatting settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Output {
    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default)]
    pub color: ColorChoice,
}

/// Enum for output formats.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,

    Json,

    Yaml,
}

/// Enum for color output choices.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    #[default]
    Auto,

    Always,

    Never,
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Network {
    /// Request timeout in seconds.
    #[serde(default = "default_network_timeout")]
    pub timeout: u64,

    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_per_host: usize,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            timeout: default_network_timeout(),
            max_idle_per_host: default_max_idle_per_host(),
        }
    }
}

fn default_network_timeout() -> u64 {
    30
}

fn default_max_idle_per_host() -> usize {
    10
}

/// Defaults for the `clean` command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Clean {
    /// How long a manifest must have been uploaded before it may be deleted,
    /// as a humantime string (`"30days"`, `"720h"`).
    #[serde(default = "default_grace")]
    pub grace: String,

    #[serde(default)]
    pub keep: usize,

    #[serde(default)]
    pub allow_tagged: bool,

    #[serde(default)]
    pub recursive: bool,

    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for Clean {
    fn default() -> Self {
        Self {
            grace: default_grace(),
            keep: 0,
            allow_tagged: false,
            recursive: false,
            concurrency: default_concurrency(),
        }
    }
}

impl Clean {
    /// Parses the grace period.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `grace` is not a valid duration.
    pub fn grace_duration(&self) -> Result<Duration> {
        humantime::parse_duration(&self.grace).map_err(|e| {
            SweepError::config_with_source(
                format!("Invalid grace period '{}'", self.grace),
                None,
                e,
            )
        })
    }
}

fn default_grace() -> String {
    "0s".to_string()
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}
