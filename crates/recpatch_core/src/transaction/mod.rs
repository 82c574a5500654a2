//! Apply transactions.
//!
//! A transaction applies a patch set field by field. The first time a
//! field is touched its prior value goes into the [`RollbackLog`]; on
//! failure every captured field is written back.

mod apply;
mod revert;
mod rollback;

pub use apply::{store_value, Applier, ApplyError, ApplyReport};
pub use revert::{restore_all, RevertReport};
pub use rollback::{RollbackEntry, RollbackLog};
