//! Field schema: typed paths, value kinds and coercion.
//!
//! Every patch path is parsed into a [`FieldPath`] and mapped to a
//! [`SchemaKind`]. The kind decides how an incoming [`recpatch_codec::Value`]
//! is coerced and how the field is written back to a record.

mod path;
mod registry;
mod value;

pub use path::FieldPath;
pub use registry::{SchemaEntry, SchemaKind, SchemaRegistry};
pub use value::{coerce, FieldValue, FieldWrite, ScriptSubstitution};
