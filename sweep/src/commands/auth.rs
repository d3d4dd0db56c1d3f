//! `sweep login` and `sweep logout`: manage the credential store.

use crate::context::AppContext;
use crate::credentials::normalize_registry;
use crate::format;
use libsweep::Credentials;
use libsweep::auth::{CredentialStore, FileCredentialStore};
use std::path::Path;

/// Handle the login subcommand
pub fn handle_login(
    ctx: &AppContext,
    registry: &str,
    username: Option<&str>,
    password: Option<&str>,
) {
    let formatter = format::create_formatter(ctx.color);

    match login(&ctx.credentials_path, registry, username, password) {
        Ok(host) => formatter.success(&format!("Stored credentials for '{}'", host)),
        Err(e) => {
            formatter.error(&e);
            std::process::exit(1);
        }
    }
}

/// Handle the logout subcommand
pub fn handle_logout(ctx: &AppContext, registry: &str) {
    let formatter = format::create_formatter(ctx.color);

    match logout(&ctx.credentials_path, registry) {
        Ok((host, true)) => formatter.success(&format!("Logged out from '{}'", host)),
        Ok((host, false)) => formatter.warning(&format!("No credentials stored for '{}'", host)),
        Err(e) => {
            formatter.error(&e);
            std::process::exit(1);
        }
    }
}

/// Prompt for username if not provided
fn prompt_username(provided_username: Option<&str>) -> Result<String, String> {
    match provided_username {
        Some(username) => Ok(username.to_string()),
        None => {
            print!("Username: ");
            std::io::Write::flush(&mut std::io::stdout())
                .map_err(|e| format!("Failed to flush stdout: {}", e))?;

            let mut username = String::new();
            std::io::stdin()
                .read_line(&mut username)
                .map_err(|e| format!("Failed to read username: {}", e))?;

            Ok(username.trim().to_string())
        }
    }
}

/// Prompt for password if not provided
fn prompt_password(provided_password: Option<&str>) -> Result<String, String> {
    match provided_password {
        Some(password) => Ok(password.to_string()),
        None => rpassword::prompt_password("Password: ")
            .map_err(|e| format!("Failed to read password: {}", e)),
    }
}

fn open_store(store_path: &Path) -> Result<FileCredentialStore, String> {
    FileCredentialStore::new(store_path.to_path_buf())
        .map_err(|e| format!("Failed to initialize credential store: {}", e))
}

/// Store Basic credentials for a registry, returning the normalized host
pub(crate) fn login(
    store_path: &Path,
    registry: &str,
    username: Option<&str>,
    password: Option<&str>,
) -> Result<String, String> {
    let host = normalize_registry(registry);
    if host.is_empty() {
        return Err("Registry name must not be empty".to_string());
    }

    let username = prompt_username(username)?;
    if username.is_empty() {
        return Err("Username must not be empty".to_string());
    }
    let password = prompt_password(password)?;

    let mut store = open_store(store_path)?;
    store
        .store(&host, &Credentials::basic(username, password))
        .map_err(|e| format!("Failed to store credentials: {}", e))?;

    Ok(host)
}

/// Remove stored credentials for a registry
///
/// Returns the normalized host and whether anything was stored for it.
pub(crate) fn logout(store_path: &Path, registry: &str) -> Result<(String, bool), String> {
    let host = normalize_registry(registry);
    let mut store = open_store(store_path)?;

    let existed = store
        .get(&host)
        .map_err(|e| format!("Failed to read credentials: {}", e))?
        .is_some();

    store
        .remove(&host)
        .map_err(|e| format!("Failed to remove credentials: {}", e))?;

    Ok((host, existed))
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
