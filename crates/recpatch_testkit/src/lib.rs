//! # recpatch Testkit
//!
//! Test utilities for recpatch.
//!
//! This crate provides:
//! - Sample record stores and temporary record-table files
//! - Property-based generators for records and field mutations
//!
//! ## Usage
//!
//! ```rust
//! use recpatch_testkit::prelude::*;
//! use recpatch_core::RecordStore;
//!
//! let store = sample_store();
//! assert_eq!(store.count(), 5);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
