//! Property-based test generators using proptest.
//!
//! Records are generated with values every field kind accepts back through
//! a patch, so anything read from a generated store can be written again.

use proptest::prelude::*;
use recpatch_codec::{Number, Value};
use recpatch_core::{Patch, Record, RecordOption, TargetSpec, VarType};
use std::collections::BTreeSet;

/// Strategy for record descriptions.
pub fn description_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][a-z]{0,7}( [A-Za-z]{1,6})?").expect("Invalid regex")
}

/// Strategy for address expressions.
pub fn address_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("(game|engine)\\.(exe|dll)\\+[0-9A-F]{1,5}").expect("Invalid regex")
}

/// Strategy for variable types.
pub fn var_type_strategy() -> impl Strategy<Value = VarType> {
    prop::sample::select(vec![
        VarType::Byte,
        VarType::TwoBytes,
        VarType::FourBytes,
        VarType::EightBytes,
        VarType::Float,
        VarType::Double,
        VarType::String,
        VarType::ByteArray,
        VarType::Binary,
        VarType::Custom,
    ])
}

/// Strategy for option sets.
pub fn options_strategy() -> impl Strategy<Value = BTreeSet<RecordOption>> {
    prop::sample::subsequence(RecordOption::ALL.to_vec(), 0..=3)
        .prop_map(|options| options.into_iter().collect())
}

/// Strategy for pointer offset lists.
pub fn offsets_strategy() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(0i64..0x1000, 0..5)
}

/// Strategy for dropdown entry lists.
pub fn dropdown_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::string::string_regex("[0-9]{1,3}:[A-Za-z]{1,8}").expect("Invalid regex"),
        0..4,
    )
}

/// Strategy for script bodies.
pub fn script_strategy() -> impl Strategy<Value = Option<String>> {
    prop::option::of(
        prop::string::string_regex("\\[ENABLE\\]\n(mov|add|nop) [a-z]{3}\n\\[DISABLE\\]\n")
            .expect("Invalid regex"),
    )
}

/// Strategy for a record without an ID.
pub fn record_strategy() -> impl Strategy<Value = Record> {
    (
        description_strategy(),
        address_strategy(),
        var_type_strategy(),
        -1000i64..1000,
        any::<(bool, bool, bool)>(),
        0i64..=0xFF_FFFF,
        options_strategy(),
        offsets_strategy(),
        dropdown_strategy(),
    )
        .prop_map(
            |(description, address, var_type, value, flags, color, options, offsets, dropdown)| {
                let (active, show_as_hex, show_as_signed) = flags;
                Record {
                    description,
                    address,
                    var_type,
                    value: Number::Integer(value),
                    active,
                    show_as_hex,
                    show_as_signed,
                    color,
                    options,
                    offsets,
                    dropdown,
                    ..Record::default()
                }
            },
        )
}

/// Strategy for a list of records.
pub fn records_strategy(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(record_strategy(), len)
}

/// A change to one known field of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldMutation {
    /// New description.
    Description(String),
    /// New address expression.
    Address(String),
    /// New variable type.
    Type(VarType),
    /// New integer value.
    Value(i64),
    /// New active flag.
    Active(bool),
    /// New hex display flag.
    ShowAsHex(bool),
    /// New signed display flag.
    ShowAsSigned(bool),
    /// New color.
    Color(i64),
    /// New option set.
    Options(BTreeSet<RecordOption>),
    /// New offset list.
    Offsets(Vec<i64>),
    /// New dropdown entries.
    DropDownList(Vec<String>),
    /// New script body, or removal.
    Script(Option<String>),
}

impl FieldMutation {
    /// Canonical path of the field this mutation writes.
    pub fn path(&self) -> &'static str {
        match self {
            FieldMutation::Description(_) => "Description",
            FieldMutation::Address(_) => "Address",
            FieldMutation::Type(_) => "Type",
            FieldMutation::Value(_) => "Value",
            FieldMutation::Active(_) => "Active",
            FieldMutation::ShowAsHex(_) => "ShowAsHex",
            FieldMutation::ShowAsSigned(_) => "ShowAsSigned",
            FieldMutation::Color(_) => "Color",
            FieldMutation::Options(_) => "Options",
            FieldMutation::Offsets(_) => "Offset",
            FieldMutation::DropDownList(_) => "DropDownList",
            FieldMutation::Script(_) => "Script",
        }
    }

    /// The patch value that performs this mutation.
    pub fn value(&self) -> Value {
        match self {
            FieldMutation::Description(s) | FieldMutation::Address(s) => Value::from(s.as_str()),
            FieldMutation::Type(t) => Value::from(t.name()),
            FieldMutation::Value(n) | FieldMutation::Color(n) => Value::Integer(*n),
            FieldMutation::Active(b) | FieldMutation::ShowAsHex(b) | FieldMutation::ShowAsSigned(b) => {
                Value::Bool(*b)
            }
            FieldMutation::Options(set) => {
                Value::Array(set.iter().map(|o| Value::from(o.name())).collect())
            }
            FieldMutation::Offsets(list) => Value::Array(list.iter().map(|&n| Value::Integer(n)).collect()),
            FieldMutation::DropDownList(list) => {
                Value::Array(list.iter().map(|s| Value::from(s.as_str())).collect())
            }
            FieldMutation::Script(body) => body.as_deref().map_or(Value::Null, Value::from),
        }
    }

    /// Applies the mutation directly to a record, bypassing the engine.
    pub fn apply_to(&self, record: &mut Record) {
        match self.clone() {
            FieldMutation::Description(s) => record.description = s,
            FieldMutation::Address(s) => record.address = s,
            FieldMutation::Type(t) => record.var_type = t,
            FieldMutation::Value(n) => record.value = Number::Integer(n),
            FieldMutation::Active(b) => record.active = b,
            FieldMutation::ShowAsHex(b) => record.show_as_hex = b,
            FieldMutation::ShowAsSigned(b) => record.show_as_signed = b,
            FieldMutation::Color(n) => record.color = n,
            FieldMutation::Options(set) => record.options = set,
            FieldMutation::Offsets(list) => record.offsets = list,
            FieldMutation::DropDownList(list) => record.dropdown = list,
            FieldMutation::Script(body) => record.script = body,
        }
    }

    /// Builds a `set` patch performing this mutation on `target`.
    pub fn to_patch(&self, id: impl Into<String>, target: TargetSpec) -> Patch {
        Patch::set(id, target, self.path(), self.value())
    }
}

/// Strategy for field mutations over every known field kind.
pub fn field_mutation_strategy() -> impl Strategy<Value = FieldMutation> {
    prop_oneof![
        description_strategy().prop_map(FieldMutation::Description),
        address_strategy().prop_map(FieldMutation::Address),
        var_type_strategy().prop_map(FieldMutation::Type),
        (-1000i64..1000).prop_map(FieldMutation::Value),
        any::<bool>().prop_map(FieldMutation::Active),
        any::<bool>().prop_map(FieldMutation::ShowAsHex),
        any::<bool>().prop_map(FieldMutation::ShowAsSigned),
        (0i64..=0xFF_FFFF).prop_map(FieldMutation::Color),
        options_strategy().prop_map(FieldMutation::Options),
        offsets_strategy().prop_map(FieldMutation::Offsets),
        dropdown_strategy().prop_map(FieldMutation::DropDownList),
        script_strategy().prop_map(FieldMutation::Script),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;

    #[test]
    fn generated_records_are_in_range() {
        let mut runner = TestRunner::default();
        for _ in 0..32 {
            let record = record_strategy().new_tree(&mut runner).unwrap().current();
            assert!((0..=0xFF_FFFF).contains(&record.color));
            assert!(!record.description.is_empty());
            assert!(record.options.len() <= 3);
        }
    }

    #[test]
    fn mutation_paths_and_values() {
        let m = FieldMutation::Offsets(vec![4, 8]);
        assert_eq!(m.path(), "Offset");
        assert_eq!(m.value(), Value::from(vec![4i64, 8]));

        let mut record = Record::new("A");
        FieldMutation::Script(Some("nop".into())).apply_to(&mut record);
        assert_eq!(record.script.as_deref(), Some("nop"));
        assert_eq!(FieldMutation::Script(None).value(), Value::Null);
    }
}
