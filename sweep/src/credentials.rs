//! Credential resolution for a registry host.
//!
//! The first source that yields something wins:
//! 1. `SWEEP_TOKEN` (Bearer)
//! 2. `SWEEP_USERNAME` and `SWEEP_PASSWORD` (Basic)
//! 3. The credential store written by `sweep login`
//! 4. Anonymous access

use libsweep::Credentials;
use libsweep::auth::{CredentialStore, FileCredentialStore};
use libsweep::reference::canonical_registry;
use std::env;
use std::path::Path;
use tracing::{debug, warn};

pub const TOKEN_ENV: &str = "SWEEP_TOKEN";
pub const USERNAME_ENV: &str = "SWEEP_USERNAME";
pub const PASSWORD_ENV: &str = "SWEEP_PASSWORD";

/// Resolve the credentials to use against `registry`
pub fn resolve(registry: &str, store_path: &Path) -> Credentials {
    resolve_with(registry, store_path, |key| env::var(key).ok())
}

pub(crate) fn resolve_with(
    registry: &str,
    store_path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Credentials {
    if let Some(token) = lookup(TOKEN_ENV).filter(|t| !t.is_empty()) {
        debug!(registry, "using bearer token from {}", TOKEN_ENV);
        return Credentials::bearer(token);
    }

    let username = lookup(USERNAME_ENV).filter(|u| !u.is_empty());
    if let (Some(username), Some(password)) = (username, lookup(PASSWORD_ENV)) {
        debug!(registry, "using basic credentials from {}", USERNAME_ENV);
        return Credentials::basic(username, password);
    }

    if store_path.is_file() {
        let key = canonical_registry(registry);
        match FileCredentialStore::new(store_path.to_path_buf()).and_then(|s| s.get(key)) {
            Ok(Some(credentials)) => {
                debug!(registry, "using stored credentials");
                return credentials;
            }
            Ok(None) => {}
            Err(e) => warn!(registry, error = %e, "Failed to read stored credentials"),
        }
    }

    debug!(registry, "no credentials found, using anonymous access");
    Credentials::anonymous()
}

/// Normalize a registry name as typed by the user into the host key used by
/// the credential store
///
/// Schemes and trailing slashes are dropped, and `docker.io` is an alias for
/// the Docker Hub API host.
pub fn normalize_registry(input: &str) -> String {
    let host = input.trim();
    let host = host
        .strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"))
        .unwrap_or(host)
        .trim_end_matches('/');

    canonical_registry(host).to_string()
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;
