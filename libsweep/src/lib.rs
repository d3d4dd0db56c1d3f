//! Sweep - Container Registry Retention Library
//!
//! Sweep deletes stale image manifests from a container registry according
//! to a retention policy: a recency cutoff, a minimum number of images to
//! keep, and whether tagged images may go.
//!
//! # Quick Start
//!
//! ```no_run
//! use chrono::{Duration, Utc};
//! use libsweep::{CleanOptions, Cleaner, Policy};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cleaner = Cleaner::builder().build()?;
//!
//!     // Untagged images uploaded more than a week ago, keeping the newest 3
//!     let policy = Policy::new(Utc::now() - Duration::days(7)).with_keep(3);
//!     let options = CleanOptions::new(policy).with_dry_run(true);
//!
//!     for digest in cleaner.clean("gcr.io/my-project/app", &options).await? {
//!         println!("would delete {}", digest);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # How a run works
//!
//! 1. The repository path is parsed into a [`Repository`].
//! 2. The [`collector`] lists it (and, when recursive, every child
//!    repository) into a flat list of [`ManifestRecord`]s.
//! 3. [`retention::plan`] sorts the records newest-created first and decides
//!    each one's [`Fate`].
//! 4. The [`Cleaner`] deletes the doomed manifests, tags before digest, with
//!    bounded parallelism. A dry run stops before this step.
//!
//! # Main Types
//!
//! - [`Cleaner`] - Main entry point for cleaning runs
//! - [`CleanerBuilder`] - Builder for credentials, network and concurrency
//! - [`Policy`] - Retention policy
//! - [`CleanError`] - Failure of a run, with the digests deleted before it
//! - [`Credentials`] - Authentication credentials
//! - [`Repository`] - Repository name parsing

#![warn(clippy::all)]

/// Returns the libsweep crate version.
///
/// # Examples
///
/// ```
/// let version = libsweep::version();
/// assert!(!version.is_empty());
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// High-level public API (main entry point)
pub use cleaner::{CleanError, CleanOptions, Cleaner, CleanerBuilder, Execution};

// Re-export commonly used types for convenience
pub use auth::Credentials;
pub use config::Config;
pub use digest::Digest;
pub use error::{Result, SweepError};
pub use manifest::{ManifestInfo, ManifestRecord};
pub use reference::{Reference, Repository};
pub use retention::{Fate, Plan, Policy};

pub mod auth;
pub mod cleaner;
pub mod client;
pub mod collector;
pub mod config;
pub mod digest;
pub mod error;
pub mod format;
pub mod manifest;
pub mod reference;
pub mod registry;
pub mod retention;
