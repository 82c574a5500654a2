//! Target resolution.

use crate::error::{CoreError, CoreResult};
use crate::record::RecordStore;
use crate::types::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Up to three alternative locators for a patch's record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Pre-order index at the time the patch was authored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    /// Record ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Record description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TargetSpec {
    /// Targets a record by index only.
    pub fn by_index(index: usize) -> Self {
        Self {
            index: Some(index),
            ..Self::default()
        }
    }

    /// Targets a record by ID only.
    pub fn by_id(id: RecordId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Targets a record by description only.
    pub fn by_description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    /// Returns true if no locator is set.
    pub fn is_empty(&self) -> bool {
        self.index.is_none() && self.id.is_none() && self.description.is_none()
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(index) = self.index {
            parts.push(format!("index={index}"));
        }
        if let Some(id) = self.id {
            parts.push(format!("id={}", id.as_u64()));
        }
        if let Some(description) = &self.description {
            parts.push(format!("description={description:?}"));
        }
        if parts.is_empty() {
            f.write_str("<empty>")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

/// Which locator resolved a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBy {
    /// Matched by index.
    Index,
    /// Matched by ID.
    Id,
    /// Matched by description.
    Description,
}

/// Resolves target specs to records: index, then ID, then description.
#[derive(Debug, Clone, Copy)]
pub struct TargetResolver {
    strict: bool,
}

impl Default for TargetResolver {
    fn default() -> Self {
        Self { strict: true }
    }
}

impl TargetResolver {
    /// Creates a resolver. With `strict` off, descriptions match trimmed
    /// and ignoring ASCII case.
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    /// Returns whether description matching is exact.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Resolves a target to a record ID and the locator that hit.
    ///
    /// An out-of-range index or unknown ID falls through to the next
    /// locator.
    pub fn resolve<S: RecordStore + ?Sized>(
        &self,
        store: &S,
        target: &TargetSpec,
    ) -> CoreResult<(RecordId, ResolvedBy)> {
        if let Some(index) = target.index {
            if index < store.count() {
                if let Some(record) = store.get_by_index(index) {
                    return Ok((record.id, ResolvedBy::Index));
                }
            }
        }
        if let Some(id) = target.id {
            if let Some(record) = store.get_by_id(id) {
                return Ok((record.id, ResolvedBy::Id));
            }
        }
        if let Some(description) = &target.description {
            if let Some(record) = store.get_by_description(description, self.strict) {
                return Ok((record.id, ResolvedBy::Description));
            }
        }
        Err(CoreError::resolution(target.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::record::MemoryRecordStore;

    fn store() -> (MemoryRecordStore, RecordId, RecordId) {
        let mut store = MemoryRecordStore::new();
        let a = store.create("Health").unwrap();
        let b = store.create("Ammo").unwrap();
        (store, a, b)
    }

    #[test]
    fn index_beats_id() {
        let (store, a, b) = store();
        let target = TargetSpec {
            index: Some(0),
            id: Some(b),
            description: None,
        };
        assert_eq!(
            TargetResolver::default().resolve(&store, &target).unwrap(),
            (a, ResolvedBy::Index)
        );
    }

    #[test]
    fn falls_through_in_order() {
        let (store, _, b) = store();
        let target = TargetSpec {
            index: Some(9),
            id: Some(b),
            description: Some("Health".into()),
        };
        assert_eq!(
            TargetResolver::default().resolve(&store, &target).unwrap(),
            (b, ResolvedBy::Id)
        );

        let target = TargetSpec {
            index: Some(9),
            id: Some(RecordId::new(99)),
            description: Some("Ammo".into()),
        };
        assert_eq!(
            TargetResolver::default().resolve(&store, &target).unwrap(),
            (b, ResolvedBy::Description)
        );
    }

    #[test]
    fn strict_description() {
        let (store, a, _) = store();
        let target = TargetSpec::by_description("health ");
        let err = TargetResolver::new(true).resolve(&store, &target).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resolution);
        assert_eq!(
            TargetResolver::new(false).resolve(&store, &target).unwrap(),
            (a, ResolvedBy::Description)
        );
    }

    #[test]
    fn empty_target_fails() {
        let (store, _, _) = store();
        let err = TargetResolver::default()
            .resolve(&store, &TargetSpec::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "no record matches target <empty>");
    }

    #[test]
    fn display() {
        let target = TargetSpec {
            index: Some(1),
            id: Some(RecordId::new(4)),
            description: Some("X".into()),
        };
        assert_eq!(target.to_string(), r#"index=1, id=4, description="X""#);
    }
}
