//! Cleaning entry point.
//!
//! [`Cleaner`] runs the whole pipeline for one repository: parse the path,
//! collect manifests, classify them with a [`Policy`], then delete the doomed
//! ones (or only report them on a dry run).
//!
//! # Examples
//!
//! ```no_run
//! use chrono::{Duration, Utc};
//! use libsweep::{CleanOptions, Cleaner, Credentials, Policy};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cleaner = Cleaner::builder()
//!         .credentials(Credentials::bearer("ya29.token"))
//!         .concurrency(8)
//!         .build()?;
//!
//!     let policy = Policy::new(Utc::now() - Duration::days(30)).with_keep(5);
//!     let options = CleanOptions::new(policy).with_recursive(true).with_dry_run(true);
//!
//!     let doomed = cleaner.clean("gcr.io/my-project/app", &options).await?;
//!     println!("would delete {} manifests", doomed.len());
//!     Ok(())
//! }
//! ```

use crate::auth::Credentials;
use crate::client::ClientConfig;
use crate::collector::Collector;
use crate::digest::Digest;
use crate::error::{Result, SweepError};
use crate::manifest::ManifestRecord;
use crate::reference::{Reference, Repository};
use crate::registry::{Registry, RegistryApi};
use crate::retention::{self, Plan, Policy};
use futures::StreamExt;
use futures::stream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;


/// Default number of manifests deleted in parallel.
pub const DEFAULT_CONCURRENCY: usize = 20;

/// Options for a single [`Cleaner::clean`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanOptions {
    /// Which manifests to delete.
    pub policy: Policy,
    /// Whether to descend into child repositories.
    pub recursive: bool,
    /// Report what would be deleted without deleting anything.
    pub dry_run: bool,
}

impl CleanOptions {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            recursive: false,
            dry_run: false,
        }
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// A failed cleaning run.
///
/// `deleted` lists the manifests that were fully removed before the failure,
/// in processing order, so callers can tell how far the run got.
#[derive(Debug, Error)]
#[error("cleaning stopped after deleting {} manifests", .deleted.len())]
pub struct CleanError {
    /// Digests deleted before the run stopped.
    pub deleted: Vec<Digest>,
    /// The first error encountered.
    #[source]
    pub source: SweepError,
}

impl From<SweepError> for CleanError {
    fn from(source: SweepError) -> Self {
        Self {
            deleted: Vec::new(),
            source,
        }
    }
}

/// Result of running a [`Plan`].
///
/// `deleted` holds the records that were fully removed, in processing order.
/// A record is identified by repository and digest, so the same digest in
/// two repositories of a recursive run stays distinguishable.
#[derive(Debug)]
pub struct Execution {
    pub deleted: Vec<ManifestRecord>,
    /// The first error encountered, if the run stopped early.
    pub error: Option<SweepError>,
}

impl Execution {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Digests of the deleted records.
    pub fn digests(&self) -> Vec<Digest> {
        self.deleted.iter().map(|r| r.digest().clone()).collect()
    }

    pub fn into_result(self) -> std::result::Result<Vec<Digest>, CleanError> {
        let deleted = self.digests();
        match self.error {
            Some(source) => Err(CleanError { deleted, source }),
            None => Ok(deleted),
        }
    }
}

/// How one manifest's deletion ended.
enum Outcome {
    Deleted,
    Skipped,
    Failed { first: bool, error: SweepError },
}

/// Deletes stale manifests from a registry.
pub struct Cleaner {
    registry: Arc<dyn RegistryApi>,
    concurrency: usize,
}

impl Cleaner {
    /// Creates a cleaner over an existing registry.
    pub fn new(registry: Arc<dyn RegistryApi>) -> Self {
        Self {
            registry,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn builder() -> CleanerBuilder {
        CleanerBuilder::new()
    }

    /// Maximum number of manifests deleted at the same time.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Cleans `repository` and returns the deleted digests.
    ///
    /// On a dry run the returned list is what would have been deleted and no
    /// delete request is sent.
    ///
    /// # Errors
    ///
    /// Returns a [`CleanError`] carrying the digests deleted so far and:
    /// - [`SweepError::InvalidRepository`] if the path is malformed
    /// - [`SweepError::List`] if collection fails (nothing is deleted)
    /// - [`SweepError::Delete`] for the first failed deletion
    pub async fn clean(
        &self,
        repository: &str,
        options: &CleanOptions,
    ) -> std::result::Result<Vec<Digest>, CleanError> {
        let repository: Repository = repository.parse()?;
        let plan = self.plan(&repository, options).await?;
        self.execute(&plan, options.dry_run).await.into_result()
    }

    /// Collects `repository` and classifies its manifests without deleting.
    pub async fn plan(&self, repository: &Repository, options: &CleanOptions) -> Result<Plan> {
        if options.recursive {
            tracing::info!(repository = %repository, "collecting recursively");
        }
        let records = Collector::new(self.registry.as_ref())
            .collect(repository, options.recursive)
            .await?;
        let plan = retention::plan(records, &options.policy);

        tracing::info!(
            repository = %repository,
            delete = plan.doomed().len(),
            kept = plan.kept_count(),
            ineligible = plan.ineligible_count(),
            "classified manifests"
        );
        Ok(plan)
    }

    /// Deletes every manifest `plan` marks for deletion.
    ///
    /// Up to [`concurrency`](Self::concurrency) manifests are in flight at
    /// once, and a slow one does not hold back the others. Each manifest
    /// loses its tags first, then its digest. After the first failure no
    /// further manifest is started; those already started are allowed to
    /// finish. On a dry run every doomed record is reported and nothing is
    /// deleted.
    pub async fn execute(&self, plan: &Plan, dry_run: bool) -> Execution {
        let doomed = plan.doomed();

        if dry_run {
            for record in &doomed {
                tracing::info!(digest = %record.digest(), repository = %record.repository(), "would delete");
            }
            return Execution {
                deleted: doomed.into_iter().cloned().collect(),
                error: None,
            };
        }

        let cancelled = AtomicBool::new(false);
        let mut outcomes: Vec<(usize, Outcome)> = stream::iter(doomed.iter().enumerate())
            .map(|(index, record)| {
                let cancelled = &cancelled;
                async move { (index, self.delete_manifest(record, cancelled).await) }
            })
            .buffer_unordered(self.concurrency.max(1))
            .collect()
            .await;
        outcomes.sort_by_key(|(index, _)| *index);

        let mut deleted = Vec::new();
        let mut failure: Option<SweepError> = None;
        let mut skipped = 0usize;
        for (index, outcome) in outcomes {
            match outcome {
                Outcome::Deleted => deleted.push(doomed[index].clone()),
                Outcome::Skipped => skipped += 1,
                Outcome::Failed { first: true, error } => failure = Some(error),
                Outcome::Failed { first: false, error } => {
                    tracing::warn!(error = %error, "additional deletion failure");
                    if failure.is_none() {
                        failure = Some(error);
                    }
                }
            }
        }

        match &failure {
            Some(_) => tracing::warn!(
                deleted = deleted.len(),
                skipped,
                "cleaning cancelled after a failed deletion"
            ),
            None => tracing::info!(deleted = deleted.len(), "cleaning complete"),
        }
        Execution {
            deleted,
            error: failure,
        }
    }

    async fn delete_manifest(&self, record: &ManifestRecord, cancelled: &AtomicBool) -> Outcome {
        if cancelled.load(Ordering::SeqCst) {
            tracing::debug!(digest = %record.digest(), "skipping, run cancelled");
            return Outcome::Skipped;
        }

        let tags = record.tag_references();
        let results =
            futures::future::join_all(tags.iter().map(|tag| self.delete_one(tag))).await;
        if let Some(error) = results.into_iter().find_map(|r| r.err()) {
            return Self::fail(error, cancelled);
        }

        match self.delete_one(&record.digest_reference()).await {
            Ok(()) => Outcome::Deleted,
            Err(error) => Self::fail(error, cancelled),
        }
    }

    async fn delete_one(&self, reference: &Reference) -> Result<()> {
        self.registry
            .delete_reference(reference)
            .await
            .map_err(|e| SweepError::delete(reference.to_string(), e))?;
        tracing::debug!(reference = %reference, "deleted");
        Ok(())
    }

    fn fail(error: SweepError, cancelled: &AtomicBool) -> Outcome {
        let first = !cancelled.swap(true, Ordering::SeqCst);
        Outcome::Failed { first, error }
    }
}

/// Builder for [`Cleaner`].
///
/// Without an explicit [`registry`](Self::registry), `build` creates an HTTP
/// [`Registry`] from the credentials and client configuration.
pub struct CleanerBuilder {
    credentials: Credentials,
    client_config: ClientConfig,
    concurrency: usize,
    registry: Option<Arc<dyn RegistryApi>>,
}

impl CleanerBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            credentials: Credentials::Anonymous,
            client_config: ClientConfig::default(),
            concurrency: DEFAULT_CONCURRENCY,
            registry: None,
        }
    }

    /// Set credentials for authentication.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn client_config(mut self, config: ClientConfig) -> Self {
        self.client_config = config;
        self
    }

    /// Set the deletion parallelism. Zero behaves like one.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Use `registry` instead of building an HTTP one.
    pub fn registry(mut self, registry: Arc<dyn RegistryApi>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Build the `Cleaner` instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn build(self) -> Result<Cleaner> {
        let registry = match self.registry {
            Some(registry) => registry,
            None => Arc::new(Registry::with_config(
                self.client_config,
                self.credentials,
            )?),
        };

        Ok(Cleaner {
            registry,
            concurrency: self.concurrency.max(1),
        })
    }
}

impl Default for CleanerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
