//! Retention classification.
//!
//! [`plan`] decides the fate of every collected manifest in one sequential
//! pass over the records sorted newest-created first:
//!
//! - a manifest is *eligible* when the tag policy allows it and it was
//!   uploaded strictly before `since`;
//! - ineligible manifests are left alone and do not count toward `keep`;
//! - the first `keep` eligible manifests are kept, the rest are deleted.

use crate::manifest::{ManifestInfo, ManifestRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;


/// Retention policy for one cleaning run.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use libsweep::Policy;
///
/// let policy = Policy::new(Utc::now()).with_keep(3);
/// assert!(!policy.allow_tagged);
/// assert_eq!(policy.keep, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Policy {
    /// Only manifests uploaded strictly before this instant can be deleted.
    pub since: DateTime<Utc>,
    /// Whether tagged manifests may be deleted.
    pub allow_tagged: bool,
    /// Number of eligible manifests to preserve, newest first.
    pub keep: usize,
}

impl Policy {
    /// Creates a policy that deletes every untagged manifest older than `since`.
    pub fn new(since: DateTime<Utc>) -> Self {
        Self {
            since,
            allow_tagged: false,
            keep: 0,
        }
    }

    /// Allows or forbids deleting tagged manifests.
    pub fn with_allow_tagged(mut self, allow_tagged: bool) -> Self {
        self.allow_tagged = allow_tagged;
        self
    }

    /// Sets the keep floor.
    pub fn with_keep(mut self, keep: usize) -> Self {
        self.keep = keep;
        self
    }

    /// Returns true if the manifest may be considered for deletion.
    pub fn is_eligible(&self, info: &ManifestInfo) -> bool {
        (self.allow_tagged || info.is_untagged()) && info.uploaded < self.since
    }
}

/// What happens to one manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Fate {
    /// Tagged while tags are protected, or too recent. Never touched.
    Ineligible,
    /// Eligible, but preserved by the keep floor.
    Kept,
    /// Eligible and beyond the keep floor.
    Delete,
}

/// The fate assigned to one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// The manifest concerned.
    pub record: ManifestRecord,
    /// What the policy decided for it.
    pub fate: Fate,
}

/// Decisions for a whole collection, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    decisions: Vec<Decision>,
}

impl Plan {
    /// All decisions, newest-created first.
    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    /// The records marked for deletion, in processing order.
    pub fn doomed(&self) -> Vec<&ManifestRecord> {
        self.with_fate(Fate::Delete).collect()
    }

    /// Consumes the plan, returning the records marked for deletion.
    pub fn into_doomed(self) -> Vec<ManifestRecord> {
        self.decisions
            .into_iter()
            .filter(|d| d.fate == Fate::Delete)
            .map(|d| d.record)
            .collect()
    }

    pub fn kept_count(&self) -> usize {
        self.with_fate(Fate::Kept).count()
    }

    pub fn ineligible_count(&self) -> usize {
        self.with_fate(Fate::Ineligible).count()
    }

    fn with_fate(&self, fate: Fate) -> impl Iterator<Item = &ManifestRecord> {
        self.decisions
            .iter()
            .filter(move |d| d.fate == fate)
            .map(|d| &d.record)
    }
}

/// Classifies `records` under `policy`.
///
/// Records are ordered by creation time, newest first. The sort is stable, so
/// records created at the same instant stay in collection order.
pub fn plan(mut records: Vec<ManifestRecord>, policy: &Policy) -> Plan {
    records.sort_by(|a, b| b.info().created.cmp(&a.info().created));

    let mut kept_so_far = 0usize;
    let decisions = records
        .into_iter()
        .map(|record| {
            let fate = if !policy.is_eligible(record.info()) {
                Fate::Ineligible
            } else if kept_so_far < policy.keep {
                kept_so_far += 1;
                Fate::Kept
            } else {
                Fate::Delete
            };
            Decision { record, fate }
        })
        .collect();

    Plan { decisions }
}
