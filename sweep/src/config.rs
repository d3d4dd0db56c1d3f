//! Locations of the configuration and credential files.
//!
//! Both honour an environment override (`SWEEP_CONFIG`, `SWEEP_CREDENTIALS`)
//! and otherwise live under the platform config directory
//! (`~/.config/sweep` on Linux).

use std::env;
use std::path::PathBuf;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "SWEEP_CONFIG";

/// Environment variable naming the credentials file
pub const CREDENTIALS_ENV: &str = "SWEEP_CREDENTIALS";

/// Get the config file path, respecting the SWEEP_CONFIG environment variable
pub fn get_config_path() -> PathBuf {
    config_path_with(|key| env::var(key).ok())
}

/// Get the credentials path, respecting the SWEEP_CREDENTIALS environment variable
pub fn get_credentials_path() -> PathBuf {
    credentials_path_with(|key| env::var(key).ok())
}

pub(crate) fn config_path_with(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    resolve(lookup(CONFIG_ENV), "config.yaml")
}

pub(crate) fn credentials_path_with(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    resolve(lookup(CREDENTIALS_ENV), "credentials.toml")
}

fn resolve(overridden: Option<String>, file_name: &str) -> PathBuf {
    if let Some(path) = overridden.filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }

    match dirs::config_dir() {
        Some(config_dir) => config_dir.join("sweep").join(file_name),
        // Fallback to current directory
        None => PathBuf::from(file_name),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
