//! Error types for recpatch core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Coarse classification of a [`CoreError`].
///
/// The first five kinds are the ones that abort an apply transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No record matches a target spec.
    Resolution,
    /// Field path or value shape does not fit the field's kind.
    Schema,
    /// Value cannot be converted to the field's kind.
    Coercion,
    /// The record store rejected a write.
    Write,
    /// Fingerprint did not match the expected value.
    Verification,
    /// Named snapshot is missing.
    Snapshot,
    /// Rollback could not restore every field.
    Revert,
    /// Value encoding failed.
    Codec,
}

/// Errors that can occur in recpatch core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No record matches the target spec.
    #[error("no record matches target {target}")]
    Resolution {
        /// Rendered target spec.
        target: String,
    },

    /// The supplied value shape does not fit the field's kind.
    #[error("schema error on {path}: {message}")]
    Schema {
        /// Canonical field path.
        path: String,
        /// Description of the mismatch.
        message: String,
    },

    /// The value could not be converted to the field's kind.
    #[error("cannot coerce value for {path}: {message}")]
    Coercion {
        /// Canonical field path.
        path: String,
        /// Description of the failure.
        message: String,
    },

    /// The store rejected a write.
    #[error("write to {path} on record {record} rejected: {message}")]
    Write {
        /// Target record.
        record: u64,
        /// Canonical field path.
        path: String,
        /// Reason for rejection.
        message: String,
    },

    /// Post-apply fingerprint mismatch.
    #[error("fingerprint mismatch: expected {expected}, got {actual}")]
    Verification {
        /// Fingerprint the caller expected.
        expected: String,
        /// Fingerprint actually computed.
        actual: String,
    },

    /// Patch operation other than `set`.
    #[error("unsupported patch operation: {op}")]
    UnsupportedOp {
        /// The operation as received.
        op: String,
    },

    /// Field path could not be parsed.
    #[error("invalid field path: {path:?}")]
    InvalidFieldPath {
        /// The path as received.
        path: String,
    },

    /// No snapshot with this name.
    #[error("snapshot not found: {name}")]
    SnapshotNotFound {
        /// Snapshot name.
        name: String,
    },

    /// A record with this ID already exists.
    #[error("duplicate record id {id}")]
    DuplicateRecordId {
        /// The conflicting ID.
        id: u64,
    },

    /// The record does not exist in the store.
    #[error("record not found: {id}")]
    RecordNotFound {
        /// The missing ID.
        id: u64,
    },

    /// Some rollback entries could not be restored.
    #[error("revert incomplete: {failed} of {total} fields not restored ({first})")]
    RevertIncomplete {
        /// Number of entries that failed.
        failed: usize,
        /// Number of entries attempted.
        total: usize,
        /// Message of the first failure.
        first: String,
    },

    /// Value encoding error.
    #[error("codec error: {0}")]
    Codec(#[from] recpatch_codec::CodecError),
}

impl CoreError {
    /// Creates a resolution error.
    pub fn resolution(target: impl Into<String>) -> Self {
        Self::Resolution {
            target: target.into(),
        }
    }

    /// Creates a schema error.
    pub fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a coercion error.
    pub fn coercion(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Coercion {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a write error.
    pub fn write(record: u64, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Write {
            record,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a verification error.
    pub fn verification(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::Verification {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates an invalid field path error.
    pub fn invalid_field_path(path: impl Into<String>) -> Self {
        Self::InvalidFieldPath { path: path.into() }
    }

    /// Returns the taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Resolution { .. } => ErrorKind::Resolution,
            CoreError::Schema { .. }
            | CoreError::UnsupportedOp { .. }
            | CoreError::InvalidFieldPath { .. } => ErrorKind::Schema,
            CoreError::Coercion { .. } => ErrorKind::Coercion,
            CoreError::Write { .. }
            | CoreError::DuplicateRecordId { .. }
            | CoreError::RecordNotFound { .. } => ErrorKind::Write,
            CoreError::Verification { .. } => ErrorKind::Verification,
            CoreError::SnapshotNotFound { .. } => ErrorKind::Snapshot,
            CoreError::RevertIncomplete { .. } => ErrorKind::Revert,
            CoreError::Codec(_) => ErrorKind::Codec,
        }
    }
}
