//! # recpatch Sync Protocol
//!
//! Wire types for fetching patch sets from a remote source.
//!
//! This crate provides:
//! - [`PatchRequest`]: `{clientVersion, fingerprint}`
//! - [`PatchResponse`]: `{status, targetVersion, requiredHash, newHash, patches}`
//! - [`WirePatch`] / [`WireTarget`]: the PascalCase patch format
//! - Conversion to and from core [`recpatch_core::PatchSet`]s
//!
//! All bodies are JSON. This is a pure protocol crate with no I/O.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod messages;
mod patch;

pub use error::{ProtocolError, ProtocolResult};
pub use messages::{PatchRequest, PatchResponse, ResponseStatus};
pub use patch::{WirePatch, WireTarget};
