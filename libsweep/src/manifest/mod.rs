//! Manifest data model.
//!
//! [`Listing`] is what one repository listing returns. [`ManifestRecord`] is
//! one collected manifest, tied back to the repository it was listed from.
//! Records are immutable once collected.

use crate::digest::Digest;
use crate::reference::{Reference, Repository};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;


/// Registry-provided metadata for a single manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestInfo {
    /// Image creation time. Drives the recency ordering.
    pub created: DateTime<Utc>,
    /// Upload time. Drives the age comparison against `since`.
    pub uploaded: DateTime<Utc>,
    /// Tags currently pointing at the manifest. Empty means untagged.
    pub tags: Vec<String>,
    /// Manifest media type, when reported.
    pub media_type: Option<String>,
    /// Total image size, when reported.
    pub size_bytes: Option<u64>,
}

impl ManifestInfo {
    /// Creates manifest metadata with the given timestamps and tags.
    pub fn new(created: DateTime<Utc>, uploaded: DateTime<Utc>, tags: Vec<String>) -> Self {
        Self {
            created,
            uploaded,
            tags,
            media_type: None,
            size_bytes: None,
        }
    }

    /// Returns true when no tag points at this manifest.
    pub fn is_untagged(&self) -> bool {
        self.tags.is_empty()
    }
}

/// The result of listing one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Manifests stored directly in the repository.
    pub manifests: Vec<(Digest, ManifestInfo)>,
    /// Names of direct child repositories, in registry order.
    pub children: Vec<String>,
}

/// A collected manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestRecord {
    digest: Digest,
    #[serde(flatten)]
    info: ManifestInfo,
    repository: Arc<Repository>,
}

impl ManifestRecord {
    /// Creates a record for `digest` listed from `repository`.
    pub fn new(digest: Digest, info: ManifestInfo, repository: Arc<Repository>) -> Self {
        Self {
            digest,
            info,
            repository,
        }
    }

    /// Returns the manifest digest.
    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    /// Returns the registry metadata.
    pub fn info(&self) -> &ManifestInfo {
        &self.info
    }

    /// Returns the repository this manifest was listed from.
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Returns the tags pointing at this manifest.
    pub fn tags(&self) -> &[String] {
        &self.info.tags
    }

    /// Returns one tag reference per tag, in listing order.
    pub fn tag_references(&self) -> Vec<Reference> {
        self.info
            .tags
            .iter()
            .map(|tag| self.repository.tag(tag.as_str()))
            .collect()
    }

    /// Returns the digest-qualified reference to this manifest.
    pub fn digest_reference(&self) -> Reference {
        self.repository.digest(self.digest.clone())
    }
}
