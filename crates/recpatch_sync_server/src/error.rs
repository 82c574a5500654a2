//! Error types for the patch source.

use recpatch_sync_protocol::ProtocolError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors raised by the patch source.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Request body could not be decoded, or a response not encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// No handler for the path.
    #[error("no route for {0}")]
    NotFound(String),

    /// A release is missing a required or new fingerprint.
    #[error("invalid release {version}: {message}")]
    InvalidRelease {
        /// Release version.
        version: String,
        /// What is wrong with it.
        message: String,
    },

    /// Another release already starts from this fingerprint.
    #[error("release {existing} already published for fingerprint {fingerprint}")]
    DuplicateRelease {
        /// Version of the release already in the catalog.
        existing: String,
        /// The shared required fingerprint.
        fingerprint: String,
    },
}

impl ServerError {
    /// Returns true if the caller sent something wrong.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ServerError::Protocol(_) | ServerError::NotFound(_))
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::Protocol(_) => 400,
            ServerError::NotFound(_) => 404,
            ServerError::InvalidRelease { .. } | ServerError::DuplicateRelease { .. } => 500,
        }
    }
}
