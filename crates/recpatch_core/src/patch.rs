//! Patches and patch sets.

use crate::error::{CoreError, CoreResult};
use crate::fingerprint::Fingerprint;
use crate::resolver::TargetSpec;
use recpatch_codec::Value;
use std::fmt;

/// Supported patch operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOp {
    /// Assign a field.
    Set,
}

impl PatchOp {
    /// Parses an operation name. A missing name means `set`.
    pub fn parse(op: Option<&str>) -> CoreResult<Self> {
        match op.map(str::trim) {
            None | Some("") => Ok(PatchOp::Set),
            Some(name) if name.eq_ignore_ascii_case("set") => Ok(PatchOp::Set),
            Some(name) => Err(CoreError::UnsupportedOp {
                op: name.to_string(),
            }),
        }
    }

    /// Returns the operation name.
    pub fn as_str(self) -> &'static str {
        match self {
            PatchOp::Set => "set",
        }
    }
}

/// A single field-level edit.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    /// Patch ID, unique only by convention.
    pub id: String,
    /// Record locators.
    pub target: TargetSpec,
    /// Operation as received; `None` means `set`.
    pub op: Option<String>,
    /// Field path as received.
    pub path: String,
    /// New value.
    pub value: Value,
}

impl Patch {
    /// Creates a `set` patch.
    pub fn set(
        id: impl Into<String>,
        target: TargetSpec,
        path: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            id: id.into(),
            target,
            op: Some(PatchOp::Set.as_str().to_string()),
            path: path.into(),
            value: value.into(),
        }
    }

    /// Returns the normalized operation.
    pub fn op(&self) -> CoreResult<PatchOp> {
        PatchOp::parse(self.op.as_deref())
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "patch {} ({} on {})", self.id, self.path, self.target)
    }
}

/// Status attached to a patch set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PatchSetStatus {
    /// Patches are ready to apply.
    #[default]
    Ok,
    /// Nothing to apply.
    UpToDate,
    /// The required fingerprint is not recognised.
    HashMismatch,
    /// Any other status string.
    Other(String),
}

impl PatchSetStatus {
    /// Parses a status string.
    pub fn parse(status: &str) -> Self {
        match status {
            "ok" => PatchSetStatus::Ok,
            "up-to-date" => PatchSetStatus::UpToDate,
            "hash-mismatch" => PatchSetStatus::HashMismatch,
            other => PatchSetStatus::Other(other.to_string()),
        }
    }

    /// Returns the status string.
    pub fn as_str(&self) -> &str {
        match self {
            PatchSetStatus::Ok => "ok",
            PatchSetStatus::UpToDate => "up-to-date",
            PatchSetStatus::HashMismatch => "hash-mismatch",
            PatchSetStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for PatchSetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered collection of patches with expected before/after fingerprints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchSet {
    /// Set status.
    pub status: PatchSetStatus,
    /// Fingerprint the store must have before applying.
    pub required_fingerprint: Option<Fingerprint>,
    /// Fingerprint the store should have after applying.
    pub new_fingerprint: Option<Fingerprint>,
    /// Patches in application order.
    pub patches: Vec<Patch>,
}

impl PatchSet {
    /// Creates an `ok` set with no fingerprints.
    pub fn new(patches: Vec<Patch>) -> Self {
        Self {
            patches,
            ..Self::default()
        }
    }

    /// Sets the required fingerprint.
    #[must_use]
    pub fn with_required(mut self, fingerprint: Fingerprint) -> Self {
        self.required_fingerprint = Some(fingerprint);
        self
    }

    /// Sets the expected post-apply fingerprint.
    #[must_use]
    pub fn with_expected(mut self, fingerprint: Fingerprint) -> Self {
        self.new_fingerprint = Some(fingerprint);
        self
    }

    /// Returns the number of patches.
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    /// Returns true if there are no patches.
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn op_normalization() {
        assert_eq!(PatchOp::parse(None).unwrap(), PatchOp::Set);
        assert_eq!(PatchOp::parse(Some("SET")).unwrap(), PatchOp::Set);
        let err = PatchOp::parse(Some("delete")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(err.to_string().contains("delete"));
    }

    #[test]
    fn status_strings() {
        for s in ["ok", "up-to-date", "hash-mismatch", "retired"] {
            assert_eq!(PatchSetStatus::parse(s).as_str(), s);
        }
        assert_eq!(
            PatchSetStatus::parse("retired"),
            PatchSetStatus::Other("retired".into())
        );
    }

    #[test]
    fn patch_display() {
        let patch = Patch::set("1", TargetSpec::by_index(0), "Description", "Y");
        assert_eq!(patch.to_string(), "patch 1 (Description on index=0)");
        assert_eq!(patch.op().unwrap(), PatchOp::Set);
    }
}
