//! Canonical text encoder.

use crate::error::{CodecError, CodecResult};
use crate::value::{Number, Value};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Encode a value to its canonical text form.
///
/// The canonical form is compact JSON where:
/// - Map keys are emitted in sorted order regardless of construction order
/// - Strings are always quoted and escaped, so no separator character
///   inside a string can be confused with structure
/// - Floats use Rust's shortest round-trip representation
///
/// # Errors
///
/// Returns an error if the value contains a non-finite float.
pub fn to_canonical_string(value: &Value) -> CodecResult<String> {
    let mut encoder = CanonicalEncoder::new();
    encoder.encode(value)?;
    Ok(encoder.into_string())
}

/// Converts a value into a `serde_json::Value`.
///
/// # Errors
///
/// Returns an error if the value contains a non-finite float.
pub fn to_json(value: &Value) -> CodecResult<serde_json::Value> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Integer(n) => serde_json::Value::from(*n),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or(CodecError::NonFiniteFloat)?,
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(to_json).collect::<CodecResult<_>>()?)
        }
        Value::Map(pairs) => {
            let mut map = serde_json::Map::new();
            for (key, v) in pairs {
                map.insert(key.clone(), to_json(v)?);
            }
            serde_json::Value::Object(map)
        }
    })
}

/// A canonical text encoder.
///
/// Output is deterministic for equal values, which makes it suitable as
/// hash input.
pub struct CanonicalEncoder {
    buffer: String,
}

impl CanonicalEncoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Create a new encoder with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: String::with_capacity(capacity),
        }
    }

    /// Encode a value.
    pub fn encode(&mut self, value: &Value) -> CodecResult<()> {
        match value {
            Value::Null => self.buffer.push_str("null"),
            Value::Bool(b) => self.buffer.push_str(if *b { "true" } else { "false" }),
            Value::Integer(n) => self.buffer.push_str(&n.to_string()),
            Value::Float(f) => self.encode_float(*f)?,
            Value::Text(s) => self.encode_text(s)?,
            Value::Array(items) => {
                self.buffer.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.buffer.push(',');
                    }
                    self.encode(item)?;
                }
                self.buffer.push(']');
            }
            Value::Map(pairs) => {
                let mut sorted: Vec<&(String, Value)> = pairs.iter().collect();
                sorted.sort_by(|a, b| a.0.cmp(&b.0));
                self.buffer.push('{');
                for (i, (key, v)) in sorted.into_iter().enumerate() {
                    if i > 0 {
                        self.buffer.push(',');
                    }
                    self.encode_text(key)?;
                    self.buffer.push(':');
                    self.encode(v)?;
                }
                self.buffer.push('}');
            }
        }
        Ok(())
    }

    /// Encode a string as a quoted, escaped literal.
    pub fn encode_text(&mut self, text: &str) -> CodecResult<()> {
        let quoted =
            serde_json::to_string(text).map_err(|e| CodecError::encoding(e.to_string()))?;
        self.buffer.push_str(&quoted);
        Ok(())
    }

    fn encode_float(&mut self, f: f64) -> CodecResult<()> {
        if !f.is_finite() {
            return Err(CodecError::NonFiniteFloat);
        }
        // Keep floats distinguishable from integers with the same magnitude.
        if f.fract() == 0.0 && f.abs() < 1e16 {
            self.buffer.push_str(&format!("{f:.1}"));
        } else {
            self.buffer.push_str(&format!("{f:?}"));
        }
        Ok(())
    }

    /// Append a raw separator or label that is known not to need escaping.
    pub fn push_raw(&mut self, raw: &str) {
        self.buffer.push_str(raw);
    }

    /// Consume this encoder and return the encoded text.
    pub fn into_string(self) -> String {
        self.buffer
    }

    /// Get a reference to the encoded text.
    pub fn as_str(&self) -> &str {
        &self.buffer
    }
}

impl Default for CanonicalEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (key, v) in pairs {
                    map.serialize_entry(key, v)?;
                }
                map.end()
            }
        }
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Number::Integer(n) => serializer.serialize_i64(n),
            Number::Float(f) => serializer.serialize_f64(f),
        }
    }
}
