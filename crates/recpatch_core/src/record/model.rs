//! Record data model.

use crate::types::RecordId;
use recpatch_codec::{Number, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The variable type a record is displayed and edited as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VarType {
    /// 1-byte integer.
    #[serde(rename = "Byte")]
    Byte,
    /// 2-byte integer.
    #[serde(rename = "2 Bytes")]
    TwoBytes,
    /// 4-byte integer.
    #[default]
    #[serde(rename = "4 Bytes")]
    FourBytes,
    /// 8-byte integer.
    #[serde(rename = "8 Bytes")]
    EightBytes,
    /// 32-bit float.
    #[serde(rename = "Float")]
    Float,
    /// 64-bit float.
    #[serde(rename = "Double")]
    Double,
    /// Text.
    #[serde(rename = "String")]
    String,
    /// Raw byte sequence.
    #[serde(rename = "Array of byte")]
    ByteArray,
    /// Bit field.
    #[serde(rename = "Binary")]
    Binary,
    /// Script record, no value of its own.
    #[serde(rename = "Auto Assembler")]
    AutoAssembler,
    /// User-defined type.
    #[serde(rename = "Custom")]
    Custom,
    /// Header that only groups children.
    #[serde(rename = "Grouped")]
    Grouped,
}

const VAR_TYPES: [(VarType, i64, &str); 12] = [
    (VarType::Byte, 0, "Byte"),
    (VarType::TwoBytes, 1, "2 Bytes"),
    (VarType::FourBytes, 2, "4 Bytes"),
    (VarType::EightBytes, 3, "8 Bytes"),
    (VarType::Float, 4, "Float"),
    (VarType::Double, 5, "Double"),
    (VarType::String, 6, "String"),
    (VarType::ByteArray, 8, "Array of byte"),
    (VarType::Binary, 9, "Binary"),
    (VarType::AutoAssembler, 11, "Auto Assembler"),
    (VarType::Custom, 13, "Custom"),
    (VarType::Grouped, 14, "Grouped"),
];

impl VarType {
    /// Returns the numeric type code.
    pub fn code(self) -> i64 {
        VAR_TYPES
            .iter()
            .find(|(t, _, _)| *t == self)
            .map_or(-1, |(_, code, _)| *code)
    }

    /// Looks up a type by numeric code.
    pub fn from_code(code: i64) -> Option<Self> {
        VAR_TYPES
            .iter()
            .find(|(_, c, _)| *c == code)
            .map(|(t, _, _)| *t)
    }

    /// Returns the display name.
    pub fn name(self) -> &'static str {
        VAR_TYPES
            .iter()
            .find(|(t, _, _)| *t == self)
            .map_or("Unknown", |(_, _, name)| *name)
    }

    /// Looks up a type by display name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        VAR_TYPES
            .iter()
            .find(|(_, _, n)| n.eq_ignore_ascii_case(name))
            .map(|(t, _, _)| *t)
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Behaviour options of a record, drawn from a fixed vocabulary.
///
/// The derived `Ord` defines the normalized order of an options set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RecordOption {
    /// Children are hidden while the record is inactive.
    HideChildren,
    /// Activating the record activates its children.
    ActivateChildrenAsWell,
    /// Deactivating the record deactivates its children.
    DeactivateChildrenAsWell,
    /// Setting the value propagates to children.
    RecursiveSetValue,
    /// Children may be expanded and collapsed by hand.
    AllowManualCollapseAndExpand,
    /// Expansion is driven by hand only.
    ManualExpandCollapse,
    /// Children are never shown.
    AlwaysHideChildren,
}

impl RecordOption {
    /// Every option in normalized order.
    pub const ALL: [RecordOption; 7] = [
        RecordOption::HideChildren,
        RecordOption::ActivateChildrenAsWell,
        RecordOption::DeactivateChildrenAsWell,
        RecordOption::RecursiveSetValue,
        RecordOption::AllowManualCollapseAndExpand,
        RecordOption::ManualExpandCollapse,
        RecordOption::AlwaysHideChildren,
    ];

    /// Returns the option name.
    pub fn name(self) -> &'static str {
        match self {
            RecordOption::HideChildren => "HideChildren",
            RecordOption::ActivateChildrenAsWell => "ActivateChildrenAsWell",
            RecordOption::DeactivateChildrenAsWell => "DeactivateChildrenAsWell",
            RecordOption::RecursiveSetValue => "RecursiveSetValue",
            RecordOption::AllowManualCollapseAndExpand => "AllowManualCollapseAndExpand",
            RecordOption::ManualExpandCollapse => "ManualExpandCollapse",
            RecordOption::AlwaysHideChildren => "AlwaysHideChildren",
        }
    }

    /// Parses an option name. A leading `mo` prefix and ASCII case are ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        let bare = name
            .strip_prefix("mo")
            .filter(|rest| rest.starts_with(|c: char| c.is_ascii_uppercase()))
            .unwrap_or(name);
        Self::ALL
            .iter()
            .copied()
            .find(|opt| opt.name().eq_ignore_ascii_case(bare))
    }
}

impl fmt::Display for RecordOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A record: one node of the record tree, without its children.
///
/// Tree structure (parent/children, position) is owned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Record {
    /// Stable identifier.
    pub id: RecordId,
    /// Free-text description, not necessarily unique.
    pub description: String,
    /// Address expression.
    pub address: String,
    /// Variable type tag.
    #[serde(rename = "type")]
    pub var_type: VarType,
    /// Current value.
    pub value: Number,
    /// Whether the record is active (frozen / script enabled).
    pub active: bool,
    /// Display the value in hexadecimal.
    pub show_as_hex: bool,
    /// Display the value as signed.
    pub show_as_signed: bool,
    /// Display color as `0xRRGGBB`.
    pub color: i64,
    /// Behaviour options.
    pub options: BTreeSet<RecordOption>,
    /// Pointer offsets, outermost first.
    pub offsets: Vec<i64>,
    /// Dropdown entries, in display order.
    pub dropdown: Vec<String>,
    /// Script body, for script records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// Fields this model has no slot for.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            id: RecordId::UNASSIGNED,
            description: String::new(),
            address: String::new(),
            var_type: VarType::default(),
            value: Number::Integer(0),
            active: false,
            show_as_hex: false,
            show_as_signed: false,
            color: 0,
            options: BTreeSet::new(),
            offsets: Vec::new(),
            dropdown: Vec::new(),
            script: None,
            extra: BTreeMap::new(),
        }
    }
}

impl Record {
    /// Creates a record with a description and defaults everywhere else.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    /// Sets the ID.
    #[must_use]
    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = id;
        self
    }

    /// Sets the address expression.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Sets the variable type.
    #[must_use]
    pub fn with_type(mut self, var_type: VarType) -> Self {
        self.var_type = var_type;
        self
    }

    /// Sets the pointer offsets.
    #[must_use]
    pub fn with_offsets(mut self, offsets: Vec<i64>) -> Self {
        self.offsets = offsets;
        self
    }

    /// Sets the dropdown entries.
    #[must_use]
    pub fn with_dropdown(mut self, entries: Vec<String>) -> Self {
        self.dropdown = entries;
        self
    }

    /// Sets the script body.
    #[must_use]
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.var_type = VarType::AutoAssembler;
        self.script = Some(script.into());
        self
    }

    /// Sets the current value.
    #[must_use]
    pub fn with_value(mut self, value: Number) -> Self {
        self.value = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_type_codes_round_trip() {
        for (t, code, name) in VAR_TYPES {
            assert_eq!(VarType::from_code(code), Some(t));
            assert_eq!(t.code(), code);
            assert_eq!(VarType::from_name(name), Some(t));
        }
        assert_eq!(VarType::from_code(7), None);
        assert_eq!(VarType::from_name("4 bytes"), Some(VarType::FourBytes));
    }

    #[test]
    fn option_names() {
        assert_eq!(
            RecordOption::from_name("moHideChildren"),
            Some(RecordOption::HideChildren)
        );
        assert_eq!(
            RecordOption::from_name(" recursivesetvalue "),
            Some(RecordOption::RecursiveSetValue)
        );
        assert_eq!(RecordOption::from_name("Nope"), None);
    }

    #[test]
    fn option_order_is_normalized() {
        let set: BTreeSet<_> = [
            RecordOption::AlwaysHideChildren,
            RecordOption::HideChildren,
        ]
        .into_iter()
        .collect();
        let names: Vec<_> = set.iter().map(|o| o.name()).collect();
        assert_eq!(names, vec!["HideChildren", "AlwaysHideChildren"]);
    }

    #[test]
    fn record_serde_defaults() {
        let record: Record = serde_json::from_str(r#"{"description":"Health"}"#).unwrap();
        assert_eq!(record.description, "Health");
        assert!(record.id.is_unassigned());
        assert_eq!(record.var_type, VarType::FourBytes);
        assert_eq!(record.value, Number::Integer(0));
    }

    #[test]
    fn record_serde_full() {
        let json = r#"{
            "id": 4,
            "description": "Ammo",
            "address": "game.exe+1234",
            "type": "2 Bytes",
            "value": 30,
            "offsets": [16, 8],
            "options": ["HideChildren"],
            "extra": {"Tag": "x"}
        }"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, RecordId::new(4));
        assert_eq!(record.var_type, VarType::TwoBytes);
        assert_eq!(record.offsets, vec![16, 8]);
        assert!(record.options.contains(&RecordOption::HideChildren));
        assert_eq!(record.extra.get("Tag"), Some(&Value::from("x")));
    }
}
