//! Published releases, keyed by the fingerprint they start from.

use crate::error::{ServerError, ServerResult};
use recpatch_core::{Fingerprint, PatchSet};
use std::collections::BTreeMap;

/// A patch set that moves a store from one fingerprint to another.
#[derive(Debug, Clone, PartialEq)]
pub struct Release {
    version: String,
    required: Fingerprint,
    target: Fingerprint,
    patches: PatchSet,
}

impl Release {
    /// Creates a release. The set must name both its required and its new
    /// fingerprint.
    pub fn new(version: impl Into<String>, patches: PatchSet) -> ServerResult<Self> {
        let version = version.into();
        let invalid = |message: &str| ServerError::InvalidRelease {
            version: version.clone(),
            message: message.to_string(),
        };
        let required = patches
            .required_fingerprint
            .clone()
            .ok_or_else(|| invalid("no required fingerprint"))?;
        let target = patches
            .new_fingerprint
            .clone()
            .ok_or_else(|| invalid("no new fingerprint"))?;
        if patches.is_empty() {
            return Err(invalid("no patches"));
        }

        Ok(Self {
            version,
            required,
            target,
            patches,
        })
    }

    /// Version the release brings a store to.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Fingerprint the patches were authored against.
    pub fn required(&self) -> &Fingerprint {
        &self.required
    }

    /// Fingerprint after applying.
    pub fn target(&self) -> &Fingerprint {
        &self.target
    }

    /// The patch set.
    pub fn patch_set(&self) -> &PatchSet {
        &self.patches
    }
}

/// Releases indexed by required fingerprint.
#[derive(Debug, Clone, Default)]
pub struct ReleaseCatalog {
    by_required: BTreeMap<String, Release>,
}

fn key(fingerprint: &str) -> String {
    fingerprint.trim().to_ascii_lowercase()
}

impl ReleaseCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a release. Two releases cannot start from the same fingerprint.
    pub fn publish(&mut self, release: Release) -> ServerResult<()> {
        let key = key(release.required.as_str());
        if let Some(existing) = self.by_required.get(&key) {
            return Err(ServerError::DuplicateRelease {
                existing: existing.version.clone(),
                fingerprint: key,
            });
        }
        tracing::info!(version = %release.version, required = %release.required, "release published");
        self.by_required.insert(key, release);
        Ok(())
    }

    /// Removes the release starting from `fingerprint`.
    pub fn withdraw(&mut self, fingerprint: &str) -> Option<Release> {
        self.by_required.remove(&key(fingerprint))
    }

    /// Returns the release starting from `fingerprint`.
    pub fn lookup(&self, fingerprint: &str) -> Option<&Release> {
        self.by_required.get(&key(fingerprint))
    }

    /// Returns true if some release ends at `fingerprint`.
    pub fn is_release_target(&self, fingerprint: &str) -> bool {
        self.by_required
            .values()
            .any(|release| release.target.matches(fingerprint))
    }

    /// Returns the published versions, ordered by required fingerprint.
    pub fn versions(&self) -> Vec<&str> {
        self.by_required.values().map(Release::version).collect()
    }

    /// Returns the number of releases.
    pub fn len(&self) -> usize {
        self.by_required.len()
    }

    /// Returns true if nothing is published.
    pub fn is_empty(&self) -> bool {
        self.by_required.is_empty()
    }
}
