//! CLI command implementations.

pub mod apply;
pub mod diff;
pub mod fingerprint;
pub mod inspect;

use recpatch_core::record::{from_table, to_table, TableEntry};
use recpatch_core::{ApplyError, CoreError, MemoryRecordStore, PatchSet, RecordStore};
use recpatch_sync_protocol::{PatchResponse, ProtocolError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors shared by the commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// File could not be read or written.
    #[error("{path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Record table is not valid JSON of the expected shape.
    #[error("{path}: not a record table: {source}")]
    Table {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// Patch set file could not be decoded.
    #[error("{path}: not a patch set: {source}")]
    PatchSet {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: ProtocolError,
    },

    /// Engine error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Apply transaction failed.
    #[error(transparent)]
    Apply(#[from] ApplyError),

    /// Output could not be encoded.
    #[error("encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type for commands.
pub type CommandResult<T> = Result<T, CommandError>;

/// Output format shared by the commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Reads a JSON record table.
pub fn load_store(path: &Path) -> CommandResult<MemoryRecordStore> {
    let bytes = std::fs::read(path).map_err(|source| CommandError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let entries: Vec<TableEntry> =
        serde_json::from_slice(&bytes).map_err(|source| CommandError::Table {
            path: path.to_path_buf(),
            source,
        })?;
    let store = from_table(entries)?;
    tracing::debug!(path = %path.display(), records = store.count(), "table loaded");
    Ok(store)
}

/// Writes a store as a JSON record table.
pub fn save_store(path: &Path, store: &MemoryRecordStore) -> CommandResult<()> {
    let json = serde_json::to_vec_pretty(&to_table(store))?;
    std::fs::write(path, json).map_err(|source| CommandError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a patch set in the patch-response JSON shape.
pub fn load_patch_set(path: &Path) -> CommandResult<(String, PatchSet)> {
    let bytes = std::fs::read(path).map_err(|source| CommandError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let invalid = |source| CommandError::PatchSet {
        path: path.to_path_buf(),
        source,
    };
    let response = PatchResponse::decode(&bytes).map_err(invalid)?;
    let set = response.to_patch_set().map_err(invalid)?;
    Ok((response.target_version, set))
}

/// Writes `bytes` to `path`.
pub fn write_file(path: &Path, bytes: &[u8]) -> CommandResult<()> {
    std::fs::write(path, bytes).map_err(|source| CommandError::Io {
        path: path.to_path_buf(),
        source,
    })
}
