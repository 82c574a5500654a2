//! # recpatch Codec
//!
//! Patch value model and canonical encoding for recpatch.
//!
//! This crate provides:
//! - [`Value`], the tagged union carried in a patch's `Value` slot
//! - [`Number`], the numeric scalar used by number-kind fields
//! - JSON decoding at the wire boundary
//! - A canonical text encoding that is stable across runs and platforms,
//!   used as fingerprint input
//!
//! ## Canonical Rules
//!
//! - Map keys are sorted bytewise
//! - Strings are always quoted and escaped
//! - Floats always carry a fractional part or exponent, integers never do
//! - No NaN or infinite values
//!
//! ## Usage
//!
//! ```
//! use recpatch_codec::{from_json_str, to_canonical_string, Value};
//!
//! let value = from_json_str(r#"{"b": 2, "a": [1, "x"]}"#).unwrap();
//! assert_eq!(to_canonical_string(&value).unwrap(), r#"{"a":[1,"x"],"b":2}"#);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod value;

pub use decoder::{from_json, from_json_slice, from_json_str};
pub use encoder::{to_canonical_string, to_json, CanonicalEncoder};
pub use error::{CodecError, CodecResult};
pub use value::{Number, Value};

/// Trait for types that can be encoded to JSON bytes.
pub trait Encode {
    /// Encode this value to JSON bytes.
    fn encode(&self) -> CodecResult<Vec<u8>>;
}

/// Trait for types that can be decoded from JSON bytes.
pub trait Decode: Sized {
    /// Decode this value from JSON bytes.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}

impl Encode for Value {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        serde_json::to_vec(&to_json(self)?).map_err(|e| CodecError::encoding(e.to_string()))
    }
}

impl Decode for Value {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        from_json_slice(bytes)
    }
}
