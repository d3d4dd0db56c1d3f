//! Repository names and deletion references.
//!
//! A [`Repository`] is a registry host plus a slash-separated path
//! (`gcr.io/my-project/app`). A [`Reference`] points at one manifest inside a
//! repository, either through a tag or through its digest.

use crate::digest::Digest;
use crate::error::{Result, SweepError};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;


/// Registry used when a repository path does not name one.
pub const DEFAULT_REGISTRY: &str = "index.docker.io";

/// Namespace prepended to single-component names on the default registry.
const DEFAULT_NAMESPACE: &str = "library";

/// Maximum length of the path portion of a repository name.
const MAX_PATH_LENGTH: usize = 255;

/// A validated repository name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    registry: String,
    path: String,
}

impl FromStr for Repository {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self> {
        let input = s.trim();
        if input.is_empty() {
            return Err(SweepError::invalid_repository(s, "repository name is empty"));
        }
        if input.contains('@') {
            return Err(SweepError::invalid_repository(
                s,
                "repository must not include a digest",
            ));
        }

        let (registry, path) = match input.split_once('/') {
            Some((first, rest)) if looks_like_registry(first) => {
                (canonical_registry(first).to_string(), rest.to_string())
            }
            _ => (DEFAULT_REGISTRY.to_string(), input.to_string()),
        };

        validate_registry(s, &registry)?;

        let path = if registry == DEFAULT_REGISTRY && !path.contains('/') {
            format!("{}/{}", DEFAULT_NAMESPACE, path)
        } else {
            path
        };

        validate_path(s, &path)?;

        Ok(Self { registry, path })
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.path)
    }
}

impl Serialize for Repository {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Repository {
    /// Returns the registry host (with port, if any).
    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// Returns the repository path within the registry.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the child repository `self/child`.
    ///
    /// # Examples
    ///
    /// ```
    /// use libsweep::Repository;
    ///
    /// let parent: Repository = "gcr.io/project".parse().unwrap();
    /// let child = parent.join("app").unwrap();
    /// assert_eq!(child.to_string(), "gcr.io/project/app");
    /// ```
    pub fn join(&self, child: &str) -> Result<Self> {
        let child = child.trim_matches('/');
        let path = format!("{}/{}", self.path, child);
        let display = format!("{}/{}", self.registry, path);
        if child.is_empty() {
            return Err(SweepError::invalid_repository(
                display,
                "child repository name is empty",
            ));
        }
        validate_path(&display, &path)?;
        Ok(Self {
            registry: self.registry.clone(),
            path,
        })
    }

    /// Returns the base URL of the registry API.
    ///
    /// Loopback and `.local` hosts are reached over plain HTTP, everything
    /// else over HTTPS.
    pub fn base_url(&self) -> String {
        let scheme = if is_insecure_host(&self.registry) {
            "http"
        } else {
            "https"
        };
        format!("{}://{}", scheme, self.registry)
    }

    /// Builds a reference to `tag` in this repository.
    pub fn tag(&self, tag: impl Into<String>) -> Reference {
        Reference {
            repository: self.clone(),
            target: Target::Tag(tag.into()),
        }
    }

    /// Builds a reference to `digest` in this repository.
    pub fn digest(&self, digest: Digest) -> Reference {
        Reference {
            repository: self.clone(),
            target: Target::Digest(digest),
        }
    }
}

/// What a [`Reference`] points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A mutable tag.
    Tag(String),
    /// An immutable content digest.
    Digest(Digest),
}

/// A tag- or digest-qualified reference to a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    repository: Repository,
    target: Target,
}

impl Reference {
    /// Returns the repository part of the reference.
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Returns the reference target.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Returns the tag or digest string used in `/v2/<name>/manifests/<reference>`.
    pub fn api_reference(&self) -> String {
        match &self.target {
            Target::Tag(tag) => tag.clone(),
            Target::Digest(digest) => digest.to_string(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Target::Tag(tag) => write!(f, "{}:{}", self.repository, tag),
            Target::Digest(digest) => write!(f, "{}@{}", self.repository, digest),
        }
    }
}

/// Maps the Docker Hub aliases onto [`DEFAULT_REGISTRY`], the host that
/// serves its registry API. Other hosts are returned unchanged.
///
/// # Examples
///
/// ```
/// use libsweep::reference::canonical_registry;
///
/// assert_eq!(canonical_registry("docker.io"), "index.docker.io");
/// assert_eq!(canonical_registry("gcr.io"), "gcr.io");
/// ```
pub fn canonical_registry(host: &str) -> &str {
    match host {
        "docker.io" | "registry-1.docker.io" => DEFAULT_REGISTRY,
        other => other,
    }
}

fn looks_like_registry(component: &str) -> bool {
    component.contains('.') || component.contains(':') || component == "localhost"
}

fn is_insecure_host(registry: &str) -> bool {
    let host = match registry.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => registry,
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    host == "localhost"
        || host == "::1"
        || host.starts_with("127.")
        || host.ends_with(".localhost")
        || host.ends_with(".local")
}

fn validate_registry(input: &str, registry: &str) -> Result<()> {
    let valid = !registry.is_empty()
        && registry
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '[' | ']'));
    if valid {
        Ok(())
    } else {
        Err(SweepError::invalid_repository(
            input,
            format!("registry '{}' is not a valid host", registry),
        ))
    }
}

fn validate_path(input: &str, path: &str) -> Result<()> {
    if path.len() > MAX_PATH_LENGTH {
        return Err(SweepError::invalid_repository(
            input,
            format!("repository path exceeds {} characters", MAX_PATH_LENGTH),
        ));
    }
    for component in path.split('/') {
        if !is_valid_component(component) {
            return Err(SweepError::invalid_repository(
                input,
                format!(
                    "component '{}' must match [a-z0-9]+((.|_|__|-+)[a-z0-9]+)*",
                    component
                ),
            ));
        }
    }
    Ok(())
}

/// Checks a single path component against the distribution naming grammar:
/// lowercase alphanumeric runs joined by `.`, `_`, `__` or any number of `-`.
fn is_valid_component(component: &str) -> bool {
    let bytes = component.as_bytes();
    let is_alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();

    if bytes.is_empty() || !is_alnum(bytes[0]) || !is_alnum(bytes[bytes.len() - 1]) {
        return false;
    }

    let mut i = 0;
    while i < bytes.len() {
        if is_alnum(bytes[i]) {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && !is_alnum(bytes[i]) {
            i += 1;
        }
        let separator = &component[start..i];
        let allowed = matches!(separator, "." | "_" | "__")
            || separator.bytes().all(|b| b == b'-');
        if !allowed {
            return false;
        }
    }
    true
}
