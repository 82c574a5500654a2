//! Typed field paths.

use crate::error::{CoreError, CoreResult};
use std::fmt;

/// A parsed field path addressing one field of a record.
///
/// Paths arrive as strings (`"Description"`, `"Offset.2"`,
/// `"DropDownList"`); parsing them once into this enum keeps string
/// matching out of the read/write paths.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldPath {
    /// Record description.
    Description,
    /// Address expression.
    Address,
    /// Variable type code.
    Type,
    /// Current value.
    Value,
    /// Active flag.
    Active,
    /// Hexadecimal display flag.
    ShowAsHex,
    /// Signed display flag.
    ShowAsSigned,
    /// Display color.
    Color,
    /// Options set.
    Options,
    /// Whole offset list.
    Offsets,
    /// One element of the offset list.
    OffsetAt(usize),
    /// Length of the offset list.
    OffsetCount,
    /// Dropdown entry list.
    DropDownList,
    /// Script body.
    Script,
    /// A field outside the known schema.
    Custom(String),
}

/// Accepted spellings for each known path. The first spelling of each
/// path is its canonical name.
const ALIASES: &[(&str, FieldPath)] = &[
    ("Description", FieldPath::Description),
    ("Desc", FieldPath::Description),
    ("Address", FieldPath::Address),
    ("Type", FieldPath::Type),
    ("VarType", FieldPath::Type),
    ("Value", FieldPath::Value),
    ("Active", FieldPath::Active),
    ("ShowAsHex", FieldPath::ShowAsHex),
    ("ShowAsSigned", FieldPath::ShowAsSigned),
    ("Color", FieldPath::Color),
    ("Options", FieldPath::Options),
    ("Offset", FieldPath::Offsets),
    ("Offsets", FieldPath::Offsets),
    ("OffsetCount", FieldPath::OffsetCount),
    ("DropDownList", FieldPath::DropDownList),
    ("DropdownList", FieldPath::DropDownList),
    ("Script", FieldPath::Script),
    ("AutoAssemblerScript", FieldPath::Script),
];

impl FieldPath {
    /// Parses a path string.
    ///
    /// Unknown names become [`FieldPath::Custom`]. Only empty paths and
    /// malformed `Offset.<n>` element paths are rejected.
    pub fn parse(path: &str) -> CoreResult<Self> {
        let path = path.trim();
        if path.is_empty() {
            return Err(CoreError::invalid_field_path(path));
        }

        if let Some((_, known)) = ALIASES.iter().find(|(alias, _)| *alias == path) {
            return Ok(known.clone());
        }

        if let Some((head, tail)) = path.split_once('.') {
            if head == "Offset" || head == "Offsets" {
                let index = tail
                    .parse::<usize>()
                    .map_err(|_| CoreError::invalid_field_path(path))?;
                return Ok(FieldPath::OffsetAt(index));
            }
        }

        Ok(FieldPath::Custom(path.to_string()))
    }

    /// Returns the canonical name of this path.
    pub fn canonical(&self) -> String {
        match self {
            FieldPath::OffsetAt(i) => format!("Offset.{i}"),
            FieldPath::Custom(name) => name.clone(),
            known => ALIASES
                .iter()
                .find(|(_, p)| p == known)
                .map(|(alias, _)| (*alias).to_string())
                .unwrap_or_default(),
        }
    }

    /// Returns the path whose prior value a rollback entry must capture.
    ///
    /// Element and length paths of the offset list roll back the whole
    /// list, so the log never holds two entries for overlapping state.
    pub fn rollback_scope(&self) -> FieldPath {
        match self {
            FieldPath::OffsetAt(_) | FieldPath::OffsetCount => FieldPath::Offsets,
            other => other.clone(),
        }
    }

    /// Returns true if writes to this path must be integral.
    pub fn requires_integer(&self) -> bool {
        matches!(
            self,
            FieldPath::Type | FieldPath::Color | FieldPath::OffsetAt(_) | FieldPath::OffsetCount
        )
    }

    /// Returns true for paths outside the known schema.
    pub fn is_custom(&self) -> bool {
        matches!(self, FieldPath::Custom(_))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}
