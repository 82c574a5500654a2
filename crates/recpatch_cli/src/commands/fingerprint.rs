//! Fingerprint command implementation.

use super::{load_store, CommandResult, Format};
use recpatch_core::{build_fingerprint, RecordStore};
use serde::Serialize;
use std::path::Path;

/// Fingerprint of one table.
#[derive(Debug, Serialize)]
pub struct FingerprintResult {
    /// Table path.
    pub path: String,
    /// Number of records.
    pub records: usize,
    /// Store fingerprint.
    pub fingerprint: String,
}

/// Computes the fingerprint of the table at `path`.
pub fn compute(path: &Path) -> CommandResult<FingerprintResult> {
    let store = load_store(path)?;
    Ok(FingerprintResult {
        path: path.display().to_string(),
        records: store.count(),
        fingerprint: build_fingerprint(&store)?.to_string(),
    })
}

/// Runs the fingerprint command.
pub fn run(path: &Path, format: Format) -> CommandResult<()> {
    let result = compute(path)?;
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        Format::Text => println!("{}", result.fingerprint),
    }
    Ok(())
}
