//! Error types for the sync client.

use recpatch_core::{ApplyError, CoreError};
use recpatch_sync_protocol::ProtocolError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can end a sync cycle.
#[derive(Error, Debug)]
pub enum SyncError {
    /// No response, or the transport failed underneath.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the request may be sent again.
        retryable: bool,
    },

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The transport was closed.
    #[error("not connected to patch source")]
    NotConnected,

    /// Response could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The patch source does not recognise the local state.
    #[error("patch source does not recognise fingerprint {local}")]
    HashMismatch {
        /// Local fingerprint sent with the request.
        local: String,
        /// Fingerprint the patch set requires, when the source named one.
        required: Option<String>,
    },

    /// Status other than `ok`, `up-to-date` or `hash-mismatch`.
    #[error("unexpected response status: {0}")]
    UnexpectedStatus(String),

    /// The confirmation prompt refused the patch set.
    #[error("patch application declined")]
    UserDeclined,

    /// The apply transaction failed.
    #[error(transparent)]
    Apply(#[from] ApplyError),

    /// Error from the core engine outside an apply transaction.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if the request phase may be repeated.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Timeout => true,
            _ => false,
        }
    }

    /// Returns true if the error happened before any record was touched.
    pub fn is_pre_mutation(&self) -> bool {
        !matches!(self, SyncError::Apply(_))
    }
}

impl From<ProtocolError> for SyncError {
    fn from(err: ProtocolError) -> Self {
        SyncError::Protocol(err.to_string())
    }
}
