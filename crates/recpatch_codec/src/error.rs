//! Codec errors.

use thiserror::Error;

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Failure converting between patch values and text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A value could not be rendered.
    #[error("cannot encode value: {message}")]
    Encoding {
        /// What went wrong.
        message: String,
    },

    /// Input is not a valid patch value.
    #[error("cannot decode value: {message}")]
    Decoding {
        /// What went wrong.
        message: String,
    },

    /// NaN and infinities have no JSON form.
    #[error("non-finite float")]
    NonFiniteFloat,

    /// Input bytes are not UTF-8.
    #[error("input is not UTF-8")]
    InvalidUtf8,

    /// Integer outside the signed 64-bit range.
    #[error("integer out of range")]
    IntegerOverflow,
}

impl CodecError {
    /// Builds a [`CodecError::Encoding`].
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Builds a [`CodecError::Decoding`].
    pub fn decoding(message: impl Into<String>) -> Self {
        Self::Decoding {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self::decoding(err.to_string())
    }
}
