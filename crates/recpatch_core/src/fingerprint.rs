//! Content fingerprint of a record store.

use crate::error::CoreResult;
use crate::record::{read_field, Record, RecordStore};
use crate::schema::{FieldPath, SchemaRegistry};
use recpatch_codec::CanonicalEncoder;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

const FIELD_SEPARATOR: &str = "|";

/// A store fingerprint: 64 lowercase hex characters of SHA-256.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wraps an already computed hex digest.
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Returns the hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if `other` names the same digest, ignoring ASCII case.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Hashes bytes to lowercase hex.
pub fn hash_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Serializes one record's observable state to a single line.
///
/// Known fields come first in registry order, then custom fields sorted by
/// name. Every name and value is canonical JSON, so text containing the
/// separator stays quoted. The record ID is not part of the line.
pub fn record_line(record: &Record) -> CoreResult<String> {
    let mut encoder = CanonicalEncoder::with_capacity(128);
    let custom = record.extra.keys().map(|name| FieldPath::Custom(name.clone()));

    for (i, path) in SchemaRegistry::known_fields()
        .iter()
        .cloned()
        .chain(custom)
        .enumerate()
    {
        if i > 0 {
            encoder.push_raw(FIELD_SEPARATOR);
        }
        encoder.encode_text(&path.canonical())?;
        encoder.push_raw("=");
        encoder.encode(&read_field(record, &path)?.to_value())?;
    }
    Ok(encoder.into_string())
}

/// Computes the fingerprint of every record in a store.
///
/// Record lines are sorted before hashing, so traversal order does not
/// affect the result.
pub fn build_fingerprint<S: RecordStore + ?Sized>(store: &S) -> CoreResult<Fingerprint> {
    let mut lines = store
        .ids()
        .into_iter()
        .filter_map(|id| store.record(id))
        .map(record_line)
        .collect::<CoreResult<Vec<_>>>()?;
    lines.sort_unstable();
    Ok(Fingerprint(hash_hex(lines.join("\n").as_bytes())))
}
