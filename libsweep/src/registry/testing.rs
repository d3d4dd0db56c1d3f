//! In-memory registry for unit tests.

use super::RegistryApi;
use crate::digest::Digest;
use crate::error::{Result, SweepError};
use crate::manifest::{Listing, ManifestInfo};
use crate::reference::{Reference, Repository};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use sha2::{Digest as _, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Builds a valid sha256 digest from an arbitrary name.
pub(crate) fn digest_of(name: &str) -> Digest {
    format!("sha256:{:x}", Sha256::digest(name.as_bytes()))
        .parse()
        .unwrap()
}

/// A fixed "now" so tests do not depend on the wall clock.
pub(crate) fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// A manifest created and uploaded `age_days` before [`now`].
pub(crate) fn info_aged(age_days: i64, tags: &[&str]) -> ManifestInfo {
    let at = now() - ChronoDuration::days(age_days);
    ManifestInfo::new(at, at, tags.iter().map(|t| t.to_string()).collect())
}

/// Registry double keyed by `registry/path`, recording every call.
#[derive(Default)]
pub(crate) struct FakeRegistry {
    listings: HashMap<String, Listing>,
    failing_lists: HashSet<String>,
    failing_deletes: HashSet<String>,
    delay: Option<Duration>,
    slow_deletes: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a repository holding `manifests` and the named children.
    pub(crate) fn with_repository(
        mut self,
        repository: &str,
        manifests: Vec<(&str, ManifestInfo)>,
        children: &[&str],
    ) -> Self {
        let listing = Listing {
            manifests: manifests
                .into_iter()
                .map(|(name, info)| (digest_of(name), info))
                .collect(),
            children: children.iter().map(|c| c.to_string()).collect(),
        };
        self.listings.insert(repository.to_string(), listing);
        self
    }

    pub(crate) fn failing_list(mut self, repository: &str) -> Self {
        self.failing_lists.insert(repository.to_string());
        self
    }

    /// Makes deletion of the reference with this display form fail.
    pub(crate) fn failing_delete(mut self, reference: &str) -> Self {
        self.failing_deletes.insert(reference.to_string());
        self
    }

    /// Makes every delete call wait before answering.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Makes deletion of this one reference wait for `delay`.
    pub(crate) fn slow_delete(mut self, reference: &str, delay: Duration) -> Self {
        self.slow_deletes.insert(reference.to_string(), delay);
        self
    }

    /// Every call in arrival order, as `list <repo>` or `delete <ref>`.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Only the delete calls, as reference display strings.
    pub(crate) fn deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix("delete ").map(str::to_string))
            .collect()
    }

    /// Highest number of delete calls observed running at once.
    pub(crate) fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RegistryApi for FakeRegistry {
    async fn list_manifests(&self, repository: &Repository) -> Result<Listing> {
        let key = repository.to_string();
        self.record(format!("list {}", key));

        if self.failing_lists.contains(&key) {
            return Err(SweepError::server(format!("listing {} failed", key), 500));
        }
        self.listings
            .get(&key)
            .cloned()
            .ok_or_else(|| SweepError::not_found("repository", key.as_str()))
    }

    async fn delete_reference(&self, reference: &Reference) -> Result<()> {
        let key = reference.to_string();
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.slow_deletes.get(&key).copied().or(self.delay) {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.record(format!("delete {}", key));

        if self.failing_deletes.contains(&key) {
            return Err(SweepError::authentication(
                format!("delete of {} denied", key),
                Some(403),
            ));
        }
        Ok(())
    }
}
