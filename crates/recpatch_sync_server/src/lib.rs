//! # recpatch Sync Server
//!
//! Reference patch source for recpatch clients.
//!
//! This crate provides:
//! - A release catalog keyed by the fingerprint each release starts from
//! - Request handling that answers `ok`, `up-to-date` or `hash-mismatch`
//! - A JSON POST entry point usable behind any HTTP front end or a
//!   loopback transport
//!
//! Releases chain naturally: the release starting from fingerprint A ends
//! at B, the one starting from B ends at C, and a client walks the chain one
//! cycle at a time.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod catalog;
mod config;
mod error;
mod server;

pub use catalog::{Release, ReleaseCatalog};
pub use config::{ServerConfig, PATCHES_PATH};
pub use error::{ServerError, ServerResult};
pub use server::PatchServer;
