//! JSON decoder.

use crate::error::{CodecError, CodecResult};
use crate::value::{Number, Value};
use serde::{Deserialize, Deserializer};

/// Decode a value from JSON bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not UTF-8 or not valid JSON.
pub fn from_json_slice(bytes: &[u8]) -> CodecResult<Value> {
    let text = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
    from_json_str(text)
}

/// Decode a value from JSON text.
///
/// # Errors
///
/// Returns an error if the text is not valid JSON.
pub fn from_json_str(text: &str) -> CodecResult<Value> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    from_json(json)
}

/// Converts a `serde_json::Value` into a [`Value`].
///
/// Integers that fit `i64` stay integers; anything else numeric becomes a
/// float. Object keys are sorted.
///
/// # Errors
///
/// Returns [`CodecError::IntegerOverflow`] for unsigned integers that do not
/// fit `i64` and cannot be represented exactly as a float.
pub fn from_json(json: serde_json::Value) -> CodecResult<Value> {
    Ok(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if n.as_u64().is_some() {
                return Err(CodecError::IntegerOverflow);
            } else {
                let f = n
                    .as_f64()
                    .ok_or_else(|| CodecError::decoding("unrepresentable number"))?;
                Value::Float(f)
            }
        }
        serde_json::Value::String(s) => Value::Text(s),
        serde_json::Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(from_json)
                .collect::<CodecResult<Vec<_>>>()?,
        ),
        serde_json::Value::Object(map) => Value::map(
            map.into_iter()
                .map(|(k, v)| Ok((k, from_json(v)?)))
                .collect::<CodecResult<Vec<_>>>()?,
        ),
    })
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        from_json(json).map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let number = match &value {
            Value::Text(text) => Number::parse(text),
            other => other.as_number(),
        };
        number.ok_or_else(|| {
            serde::de::Error::custom(format!("expected a number, got {}", value.type_name()))
        })
    }
}
