//! Schema registry: field path to value kind.

use super::path::FieldPath;
use crate::error::CoreResult;
use std::fmt;

/// The kind of a field, governing how it is read, coerced, written and diffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    /// Free text.
    String,
    /// Integer or float.
    Number,
    /// Boolean flag.
    Bool,
    /// Order-normalized set from a fixed vocabulary.
    OptionsSet,
    /// Ordered integers.
    OffsetList,
    /// Ordered strings.
    EntryList,
    /// Script text, optionally patched by scoped substitution.
    Script,
    /// Opaque passthrough.
    Unknown,
}

impl SchemaKind {
    /// Returns true for the list kinds, which are always replaced whole.
    pub fn is_list(self) -> bool {
        matches!(self, SchemaKind::OffsetList | SchemaKind::EntryList)
    }

    /// Returns the kind name.
    pub fn name(self) -> &'static str {
        match self {
            SchemaKind::String => "string",
            SchemaKind::Number => "number",
            SchemaKind::Bool => "bool",
            SchemaKind::OptionsSet => "options-set",
            SchemaKind::OffsetList => "offset-list",
            SchemaKind::EntryList => "entry-list",
            SchemaKind::Script => "script",
            SchemaKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved schema entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaEntry {
    /// Value kind.
    pub kind: SchemaKind,
    /// Canonical path.
    pub path: FieldPath,
}

/// Fields every record carries, in the fixed order used for snapshots,
/// diffs and fingerprints.
static KNOWN_FIELDS: [FieldPath; 12] = [
    FieldPath::Description,
    FieldPath::Address,
    FieldPath::Type,
    FieldPath::Value,
    FieldPath::Active,
    FieldPath::ShowAsHex,
    FieldPath::ShowAsSigned,
    FieldPath::Color,
    FieldPath::Options,
    FieldPath::Offsets,
    FieldPath::DropDownList,
    FieldPath::Script,
];

/// Static mapping from field path to kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaRegistry;

impl SchemaRegistry {
    /// Looks up a path string.
    ///
    /// Unknown paths map to [`SchemaKind::Unknown`] rather than failing,
    /// so fields this registry does not know stay patchable.
    pub fn lookup(path: &str) -> CoreResult<SchemaEntry> {
        let path = FieldPath::parse(path)?;
        Ok(SchemaEntry {
            kind: Self::kind_of(&path),
            path,
        })
    }

    /// Returns the kind of a parsed path.
    pub fn kind_of(path: &FieldPath) -> SchemaKind {
        match path {
            FieldPath::Description | FieldPath::Address => SchemaKind::String,
            FieldPath::Type
            | FieldPath::Value
            | FieldPath::Color
            | FieldPath::OffsetAt(_)
            | FieldPath::OffsetCount => SchemaKind::Number,
            FieldPath::Active | FieldPath::ShowAsHex | FieldPath::ShowAsSigned => SchemaKind::Bool,
            FieldPath::Options => SchemaKind::OptionsSet,
            FieldPath::Offsets => SchemaKind::OffsetList,
            FieldPath::DropDownList => SchemaKind::EntryList,
            FieldPath::Script => SchemaKind::Script,
            FieldPath::Custom(_) => SchemaKind::Unknown,
        }
    }

    /// Returns the schema-known fields in canonical order.
    pub fn known_fields() -> &'static [FieldPath] {
        &KNOWN_FIELDS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known() {
        let entry = SchemaRegistry::lookup("Offset").unwrap();
        assert_eq!(entry.kind, SchemaKind::OffsetList);
        assert_eq!(entry.path, FieldPath::Offsets);

        let entry = SchemaRegistry::lookup("DropDownList").unwrap();
        assert_eq!(entry.kind, SchemaKind::EntryList);

        let entry = SchemaRegistry::lookup("Offset.1").unwrap();
        assert_eq!(entry.kind, SchemaKind::Number);
    }

    #[test]
    fn lookup_unknown_is_passthrough() {
        let entry = SchemaRegistry::lookup("Hotkeys").unwrap();
        assert_eq!(entry.kind, SchemaKind::Unknown);
        assert!(entry.path.is_custom());
    }

    #[test]
    fn known_fields_have_known_kinds() {
        for path in SchemaRegistry::known_fields() {
            assert_ne!(SchemaRegistry::kind_of(path), SchemaKind::Unknown);
        }
        assert_eq!(SchemaRegistry::known_fields().len(), 12);
    }

    #[test]
    fn list_kinds() {
        assert!(SchemaKind::OffsetList.is_list());
        assert!(SchemaKind::EntryList.is_list());
        assert!(!SchemaKind::OptionsSet.is_list());
        assert_eq!(SchemaKind::OptionsSet.to_string(), "options-set");
    }
}
