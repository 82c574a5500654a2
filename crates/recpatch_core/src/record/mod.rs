//! Records and record stores.

mod access;
mod memory;
mod model;
mod store;
mod table;

pub use access::{read_field, write_field};
pub use memory::MemoryRecordStore;
pub use model::{Record, RecordOption, VarType};
pub use store::RecordStore;
pub use table::{from_table, to_table, TableEntry};
