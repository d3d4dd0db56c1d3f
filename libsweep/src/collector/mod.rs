//! Manifest collection.
//!
//! The [`Collector`] lists a repository and, when asked, every repository
//! below it, flattening the manifests it finds into one sequence of
//! [`ManifestRecord`]s. Traversal is depth-first pre-order: a repository's own
//! manifests come first, then each child subtree in the order the registry
//! listed the children.

use crate::error::{Result, SweepError};
use crate::manifest::ManifestRecord;
use crate::reference::Repository;
use crate::registry::RegistryApi;
use std::collections::HashSet;
use std::sync::Arc;


/// Walks a repository tree and gathers its manifests.
pub struct Collector<'a> {
    registry: &'a dyn RegistryApi,
}

impl<'a> Collector<'a> {
    /// Creates a collector that lists through `registry`.
    pub fn new(registry: &'a dyn RegistryApi) -> Self {
        Self { registry }
    }

    /// Collects every manifest under `root`.
    ///
    /// Without `recursive`, only `root` itself is listed. The result is
    /// all-or-nothing: the first failure anywhere in the tree is returned and
    /// everything gathered so far is dropped.
    ///
    /// # Errors
    ///
    /// - [`SweepError::List`] if listing any repository fails
    /// - [`SweepError::InvalidRepository`] if a child name does not form a
    ///   valid repository path
    pub async fn collect(
        &self,
        root: &Repository,
        recursive: bool,
    ) -> Result<Vec<ManifestRecord>> {
        let mut records = Vec::new();
        let mut pending = vec![root.clone()];
        let mut visited = HashSet::new();
        let mut listed = 0usize;

        while let Some(repository) = pending.pop() {
            if !visited.insert(repository.clone()) {
                tracing::warn!(repository = %repository, "repository already visited, skipping");
                continue;
            }

            tracing::debug!(repository = %repository, "listing manifests");
            let listing = self
                .registry
                .list_manifests(&repository)
                .await
                .map_err(|e| SweepError::list(repository.to_string(), e))?;
            listed += 1;

            let repository = Arc::new(repository);
            records.extend(listing.manifests.into_iter().map(|(digest, info)| {
                ManifestRecord::new(digest, info, Arc::clone(&repository))
            }));

            if recursive {
                let children = listing
                    .children
                    .iter()
                    .map(|child| repository.join(child))
                    .collect::<Result<Vec<_>>>()?;
                // Reversed so the first child is popped first.
                pending.extend(children.into_iter().rev());
            }
        }

        tracing::info!(
            root = %root,
            repositories = listed,
            manifests = records.len(),
            "collected manifests"
        );
        Ok(records)
    }
}
