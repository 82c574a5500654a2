//! # recpatch Sync Engine
//!
//! Client side of remote patch delivery.
//!
//! This crate provides:
//! - The sync state machine ([`SyncClient`])
//! - Retry with exponential backoff for the request phase
//! - A transport abstraction with an HTTP implementation over any
//!   [`HttpClient`], plus a loopback client for in-process servers
//! - The confirmation gate ([`ConfirmationPrompt`])
//!
//! ## Cycle
//!
//! 1. Fingerprint the local store and send `{clientVersion, fingerprint}`
//! 2. `up-to-date` ends the cycle; `hash-mismatch` ends it with an error
//! 3. `ok` with patches asks for confirmation, then applies them as one
//!    transaction and verifies the new fingerprint
//!
//! ## Key Invariants
//!
//! - Nothing is written before the confirmation gate agrees
//! - Only the request is retried, never an apply
//! - A failed or unverified apply is reverted in safe mode

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod confirm;
mod error;
mod http;
mod state;
mod transport;

pub use config::{RetryConfig, SyncConfig, DEFAULT_ENDPOINT};
pub use confirm::{AlwaysConfirm, AlwaysDecline, ConfirmationPrompt};
pub use error::{SyncError, SyncResult};
pub use http::{
    HttpClient, HttpFailure, HttpTransport, JsonDecode, JsonEncode, LoopbackClient, LoopbackServer,
};
pub use state::{SyncClient, SyncOutcome, SyncState, SyncStats};
pub use transport::{MockTransport, PatchTransport};
