//! # recpatch Core
//!
//! Transactional field-level patching of a record tree.
//!
//! This crate provides:
//! - The record model and the [`RecordStore`] accessor trait, with an
//!   in-memory implementation
//! - Typed field paths and the schema registry that maps them to kinds
//! - Order-independent store fingerprints
//! - Target resolution (index, then ID, then description)
//! - Named snapshots and snapshot-to-current diffing
//! - Apply transactions with first-touch rollback and full revert
//!
//! ## Key Invariants
//!
//! - A record's ID never changes; its index is recomputed on every call
//! - The fingerprint does not depend on record order
//! - At most one rollback entry exists per `(record, field)` per transaction
//! - In safe mode a failed apply leaves the store as it was before

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod diff;
mod engine;
mod error;
mod fingerprint;
mod patch;
pub mod record;
mod resolver;
pub mod schema;
mod snapshot;
pub mod transaction;
mod types;

pub use config::EngineConfig;
pub use diff::generate_patch_set;
pub use engine::PatchEngine;
pub use error::{CoreError, CoreResult, ErrorKind};
pub use fingerprint::{build_fingerprint, hash_hex, record_line, Fingerprint};
pub use patch::{Patch, PatchOp, PatchSet, PatchSetStatus};
pub use record::{MemoryRecordStore, Record, RecordOption, RecordStore, TableEntry, VarType};
pub use resolver::{ResolvedBy, TargetResolver, TargetSpec};
pub use snapshot::{RecordState, Snapshot, SnapshotOptions, SnapshotStore};
pub use transaction::{ApplyError, ApplyReport, RevertReport, RollbackLog};
pub use types::RecordId;
