//! Protocol error types.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while encoding, decoding or converting wire messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A message could not be encoded.
    #[error("encoding failed: {message}")]
    Encoding {
        /// Error message.
        message: String,
    },

    /// A message body is not valid.
    #[error("decoding failed: {message}")]
    Decoding {
        /// Error message.
        message: String,
    },

    /// A field holds a value the core model cannot represent.
    #[error("invalid {field}: {message}")]
    InvalidField {
        /// Wire field name.
        field: &'static str,
        /// Error message.
        message: String,
    },
}

impl ProtocolError {
    /// Creates an invalid-field error.
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn encoding(err: serde_json::Error) -> Self {
        Self::Encoding {
            message: err.to_string(),
        }
    }

    pub(crate) fn decoding(err: serde_json::Error) -> Self {
        Self::Decoding {
            message: err.to_string(),
        }
    }
}
