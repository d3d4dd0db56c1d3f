//! Credential storage for registry authentication.
//!
//! Credentials are kept in a TOML file keyed by registry host, with
//! restricted permissions (0600). Secrets are base64 encoded, which is
//! obfuscation only.

use crate::auth::Credentials;
use crate::error::{Result, SweepError};
use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Trait for storing and retrieving registry credentials.
pub trait CredentialStore {
    /// Store credentials for a registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are anonymous or cannot be written.
    fn store(&mut self, registry: &str, credentials: &Credentials) -> Result<()>;

    /// Retrieve credentials for a registry, if any are stored.
    fn get(&self, registry: &str) -> Result<Option<Credentials>>;

    /// Remove credentials for a registry. Removing a missing entry is not an error.
    fn remove(&mut self, registry: &str) -> Result<()>;

    /// List all registries with stored credentials, sorted.
    fn list(&self) -> Result<Vec<String>>;
}

/// Stored credential representation for serialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum StoredCredential {
    Basic { username: String, password: String },
    Bearer { token: String },
}

/// File-based credential store implementation.
///
/// # Examples
///
/// ```no_run
/// use libsweep::auth::{Credentials, CredentialStore, FileCredentialStore};
/// use std::path::PathBuf;
///
/// # fn example() -> libsweep::Result<()> {
/// let path = PathBuf::from("/home/user/.config/sweep/credentials.toml");
/// let mut store = FileCredentialStore::new(path)?;
///
/// store.store("gcr.io", &Credentials::basic("_token", "ya29.secret"))?;
/// assert!(store.get("gcr.io")?.is_some());
/// store.remove("gcr.io")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    credentials: BTreeMap<String, StoredCredential>,
}

impl FileCredentialStore {
    /// Opens the store at `path`, loading it if the file exists.
    ///
    /// The parent directory is created if it does not exist.
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SweepError::config_with_source(
                    "Failed to create credentials directory",
                    parent.to_str(),
                    e,
                )
            })?;
        }

        let credentials = if path.exists() {
            Self::load_from_file(&path)?
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, credentials })
    }

    /// Returns the file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_file(path: &Path) -> Result<BTreeMap<String, StoredCredential>> {
        let contents = fs::read_to_string(path).map_err(|e| {
            SweepError::config_with_source("Failed to read credentials file", path.to_str(), e)
        })?;

        toml::from_str(&contents).map_err(|e| {
            SweepError::config_with_source("Failed to parse credentials file", path.to_str(), e)
        })
    }

    fn save_to_file(&self) -> Result<()> {
        let contents = toml::to_string_pretty(&self.credentials).map_err(|e| {
            SweepError::config_with_source(
                "Failed to serialize credentials",
                self.path.to_str(),
                e,
            )
        })?;

        fs::write(&self.path, contents).map_err(|e| {
            SweepError::config_with_source(
                "Failed to write credentials file",
                self.path.to_str(),
                e,
            )
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&self.path, permissions).map_err(|e| {
                SweepError::config_with_source(
                    "Failed to set credentials file permissions",
                    self.path.to_str(),
                    e,
                )
            })?;
        }

        Ok(())
    }

    fn encode_credential(credentials: &Credentials) -> Result<StoredCredential> {
        match credentials {
            Credentials::Basic { username, password } => Ok(StoredCredential::Basic {
                username: username.clone(),
                password: general_purpose::STANDARD.encode(password),
            }),
            Credentials::Bearer { token } => Ok(StoredCredential::Bearer {
                token: general_purpose::STANDARD.encode(token),
            }),
            Credentials::Anonymous => {
                Err(SweepError::validation("Cannot store anonymous credentials"))
            }
        }
    }

    fn decode_secret(encoded: &str) -> Result<String> {
        let bytes = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| SweepError::validation_with_source("Failed to decode secret", e))?;

        String::from_utf8(bytes)
            .map_err(|e| SweepError::validation_with_source("Invalid secret encoding", e))
    }

    fn decode_credential(stored: &StoredCredential) -> Result<Credentials> {
        match stored {
            StoredCredential::Basic { username, password } => Ok(Credentials::Basic {
                username: username.clone(),
                password: Self::decode_secret(password)?,
            }),
            StoredCredential::Bearer { token } => Ok(Credentials::Bearer {
                token: Self::decode_secret(token)?,
            }),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn store(&mut self, registry: &str, credentials: &Credentials) -> Result<()> {
        let stored = Self::encode_credential(credentials)?;
        self.credentials.insert(registry.to_string(), stored);
        self.save_to_file()
    }

    fn get(&self, registry: &str) -> Result<Option<Credentials>> {
        self.credentials
            .get(registry)
            .map(Self::decode_credential)
            .transpose()
    }

    fn remove(&mut self, registry: &str) -> Result<()> {
        if self.credentials.remove(registry).is_some() {
            self.save_to_file()?;
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(self.credentials.keys().cloned().collect())
    }
}
