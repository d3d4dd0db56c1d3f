//! Error types for Sweep
//!
//! Every fallible library operation returns [`SweepError`]. Transport-level
//! failures from the registry client are wrapped by the collector and the
//! cleaner into [`SweepError::List`] and [`SweepError::Delete`] so callers can
//! tell which phase of a run failed.

use thiserror::Error;


/// Main error type for Sweep operations
#[derive(Error, Debug)]
pub enum SweepError {
    /// Network-related errors (connection, timeout, DNS)
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Authentication errors (401, 403, token issues)
    #[error("Authentication error (status: {status_code:?}): {message}")]
    Authentication {
        message: String,
        status_code: Option<u16>,
    },

    /// Resource not found errors (404)
    #[error("{resource_type} not found: {name}")]
    NotFound { resource_type: String, name: String },

    /// Rate limiting errors (429)
    #[error("Rate limit: {message}")]
    RateLimit {
        message: String,
        retry_after: Option<u64>,
    },

    /// Server errors (500, 502, 503, 504)
    #[error("Server error (status: {status_code}): {message}")]
    Server { message: String, status_code: u16 },

    /// Validation errors (malformed response, bad digest, etc.)
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors (invalid config file, missing settings)
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The repository path does not follow registry naming rules.
    #[error("Invalid repository '{path}': {message}")]
    InvalidRepository { path: String, message: String },

    /// Listing a repository failed. Fatal for the whole collection.
    #[error("Failed to list manifests for {repository}: {source}")]
    List {
        repository: String,
        #[source]
        source: Box<SweepError>,
    },

    /// Deleting a tag or digest reference failed. Fatal for the rest of the run.
    #[error("Failed to delete {reference}: {source}")]
    Delete {
        reference: String,
        #[source]
        source: Box<SweepError>,
    },
}

/// Result type alias for Sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

impl SweepError {
    /// Creates a new network error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libsweep::error::SweepError;
    ///
    /// let err = SweepError::network("connection refused");
    /// assert!(matches!(err, SweepError::Network { .. }));
    /// ```
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new network error with a source error.
    pub fn network_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new authentication error.
    pub fn authentication<S: Into<String>>(message: S, status_code: Option<u16>) -> Self {
        Self::Authentication {
            message: message.into(),
            status_code,
        }
    }

    /// Creates a new not found error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libsweep::error::SweepError;
    ///
    /// let err = SweepError::not_found("repository", "team/app");
    /// assert_eq!(err.to_string(), "repository not found: team/app");
    /// ```
    pub fn not_found<S: Into<String>>(resource_type: S, name: S) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }

    /// Creates a new rate limit error.
    pub fn rate_limit<S: Into<String>>(message: S, retry_after: Option<u64>) -> Self {
        Self::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    /// Creates a new server error.
    pub fn server<S: Into<String>>(message: S, status_code: u16) -> Self {
        Self::Server {
            message: message.into(),
            status_code,
        }
    }

    /// Creates a new validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new validation error with a source error.
    pub fn validation_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Validation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S, path: Option<S>) -> Self {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: None,
        }
    }

    /// Creates a new configuration error with a source error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libsweep::error::SweepError;
    /// use std::io;
    ///
    /// let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
    /// let err = SweepError::config_with_source("failed to read config", Some("/etc/sweep.yaml"), io_err);
    /// assert!(matches!(err, SweepError::Config { .. }));
    /// ```
    pub fn config_with_source<S, E>(message: S, path: Option<S>, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an invalid repository error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libsweep::error::SweepError;
    ///
    /// let err = SweepError::invalid_repository("UPPER/case", "must be lowercase");
    /// assert!(matches!(err, SweepError::InvalidRepository { .. }));
    /// ```
    pub fn invalid_repository<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::InvalidRepository {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Wraps a transport error raised while listing `repository`.
    pub fn list<R: Into<String>>(repository: R, source: SweepError) -> Self {
        Self::List {
            repository: repository.into(),
            source: Box::new(source),
        }
    }

    /// Wraps a transport error raised while deleting `reference`.
    pub fn delete<R: Into<String>>(reference: R, source: SweepError) -> Self {
        Self::Delete {
            reference: reference.into(),
            source: Box::new(source),
        }
    }
}
