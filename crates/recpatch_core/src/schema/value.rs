//! Typed field values and coercion from untyped patch values.

use super::path::FieldPath;
use super::registry::{SchemaEntry, SchemaKind};
use crate::error::{CoreError, CoreResult};
use crate::record::{RecordOption, VarType};
use recpatch_codec::{Number, Value};
use regex::Regex;
use std::collections::BTreeSet;

/// A field value constrained to its schema kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// String kind.
    Text(String),
    /// Number kind.
    Number(Number),
    /// Bool kind.
    Bool(bool),
    /// Options-set kind, already normalized by the set's ordering.
    Options(BTreeSet<RecordOption>),
    /// Offset-list kind.
    Offsets(Vec<i64>),
    /// Entry-list kind.
    Entries(Vec<String>),
    /// Script kind; `None` means the record has no script.
    Script(Option<String>),
    /// Unknown kind, stored as received.
    Raw(Value),
}

impl FieldValue {
    /// Returns the kind this value belongs to.
    pub fn kind(&self) -> SchemaKind {
        match self {
            FieldValue::Text(_) => SchemaKind::String,
            FieldValue::Number(_) => SchemaKind::Number,
            FieldValue::Bool(_) => SchemaKind::Bool,
            FieldValue::Options(_) => SchemaKind::OptionsSet,
            FieldValue::Offsets(_) => SchemaKind::OffsetList,
            FieldValue::Entries(_) => SchemaKind::EntryList,
            FieldValue::Script(_) => SchemaKind::Script,
            FieldValue::Raw(_) => SchemaKind::Unknown,
        }
    }

    /// Converts back to an untyped value, as emitted in patches.
    pub fn to_value(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::Text(s.clone()),
            FieldValue::Number(n) => Value::from(*n),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Options(set) => {
                Value::Array(set.iter().map(|o| Value::from(o.name())).collect())
            }
            FieldValue::Offsets(list) => Value::Array(list.iter().map(|&n| Value::Integer(n)).collect()),
            FieldValue::Entries(list) => {
                Value::Array(list.iter().map(|s| Value::Text(s.clone())).collect())
            }
            FieldValue::Script(body) => body.clone().map_or(Value::Null, Value::Text),
            FieldValue::Raw(v) => v.clone(),
        }
    }
}

/// A scoped substitution inside a script body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSubstitution {
    /// Text (or pattern) to find.
    pub search: String,
    /// Replacement text. In pattern mode `$1` style references expand.
    pub replace: String,
    /// Maximum number of occurrences to replace; 0 replaces all.
    pub count: usize,
    /// Treat `search` as a regular expression.
    pub pattern: bool,
}

impl ScriptSubstitution {
    /// Applies the substitution to a body.
    ///
    /// Fails if the search text does not occur in the body.
    pub fn apply(&self, body: &str) -> CoreResult<String> {
        let path = FieldPath::Script.canonical();
        if self.search.is_empty() {
            return Err(CoreError::coercion(path, "empty search text"));
        }

        if self.pattern {
            let re = Regex::new(&self.search)
                .map_err(|e| CoreError::coercion(&path, format!("invalid pattern: {e}")))?;
            if !re.is_match(body) {
                return Err(CoreError::coercion(
                    path,
                    format!("pattern {:?} not found in script", self.search),
                ));
            }
            return Ok(re
                .replacen(body, self.count, self.replace.as_str())
                .into_owned());
        }

        if !body.contains(self.search.as_str()) {
            return Err(CoreError::coercion(
                path,
                format!("search text {:?} not found in script", self.search),
            ));
        }
        Ok(if self.count == 0 {
            body.replace(self.search.as_str(), &self.replace)
        } else {
            body.replacen(self.search.as_str(), &self.replace, self.count)
        })
    }
}

/// What a coerced patch does to its field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldWrite {
    /// Replace the field with this value.
    Assign(FieldValue),
    /// Edit the current script body in place.
    Substitute(ScriptSubstitution),
}

/// Coerces an untyped patch value to the kind of a schema entry.
///
/// Container/scalar mismatches are schema errors; scalars that cannot be
/// converted are coercion errors.
pub fn coerce(entry: &SchemaEntry, value: &Value) -> CoreResult<FieldWrite> {
    let path = &entry.path;
    let assigned = match entry.kind {
        SchemaKind::String => FieldValue::Text(coerce_text(path, value)?),
        SchemaKind::Number => FieldValue::Number(coerce_number(path, value)?),
        SchemaKind::Bool => FieldValue::Bool(coerce_bool(path, value)?),
        SchemaKind::OptionsSet => FieldValue::Options(coerce_options(path, value)?),
        SchemaKind::OffsetList => FieldValue::Offsets(coerce_offsets(path, value)?),
        SchemaKind::EntryList => FieldValue::Entries(coerce_entries(path, value)?),
        SchemaKind::Script => return coerce_script(path, value),
        SchemaKind::Unknown => FieldValue::Raw(value.clone()),
    };
    Ok(FieldWrite::Assign(assigned))
}

fn shape_error(path: &FieldPath, expected: SchemaKind, value: &Value) -> CoreError {
    CoreError::schema(
        path.canonical(),
        format!("{} field cannot take a {} value", expected, value.type_name()),
    )
}

fn coerce_text(path: &FieldPath, value: &Value) -> CoreResult<String> {
    match value {
        Value::Text(s) => Ok(s.clone()),
        Value::Integer(n) => Ok(n.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Array(_) | Value::Map(_) => Err(shape_error(path, SchemaKind::String, value)),
        Value::Null | Value::Bool(_) => Err(CoreError::coercion(
            path.canonical(),
            format!("{} is not text", value.type_name()),
        )),
    }
}

fn coerce_number(path: &FieldPath, value: &Value) -> CoreResult<Number> {
    let number = match value {
        Value::Integer(n) => Number::Integer(*n),
        Value::Float(f) => Number::Float(*f),
        Value::Text(s) => match (path, VarType::from_name(s)) {
            (FieldPath::Type, Some(var_type)) => Number::Integer(var_type.code()),
            _ => Number::parse(s).ok_or_else(|| {
                CoreError::coercion(path.canonical(), format!("{s:?} is not a number"))
            })?,
        },
        Value::Array(_) | Value::Map(_) => {
            return Err(shape_error(path, SchemaKind::Number, value))
        }
        Value::Null | Value::Bool(_) => {
            return Err(CoreError::coercion(
                path.canonical(),
                format!("{} is not a number", value.type_name()),
            ))
        }
    };

    if !path.requires_integer() {
        return Ok(number);
    }
    let n = number.as_integer().ok_or_else(|| {
        CoreError::coercion(path.canonical(), format!("{number} is not an integer"))
    })?;
    match path {
        FieldPath::Type if VarType::from_code(n).is_none() => Err(CoreError::coercion(
            path.canonical(),
            format!("unknown type code {n}"),
        )),
        FieldPath::Color if !(0..=0xFF_FFFF).contains(&n) => Err(CoreError::coercion(
            path.canonical(),
            format!("color {n:#x} out of range"),
        )),
        FieldPath::OffsetCount if n < 0 => Err(CoreError::coercion(
            path.canonical(),
            "offset count cannot be negative",
        )),
        _ => Ok(Number::Integer(n)),
    }
}

fn coerce_bool(path: &FieldPath, value: &Value) -> CoreResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Integer(0) => Ok(false),
        Value::Integer(1) => Ok(true),
        Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(CoreError::coercion(
                path.canonical(),
                format!("{s:?} is not a boolean"),
            )),
        },
        Value::Array(_) | Value::Map(_) => Err(shape_error(path, SchemaKind::Bool, value)),
        _ => Err(CoreError::coercion(
            path.canonical(),
            format!("{} is not a boolean", value.type_name()),
        )),
    }
}

fn coerce_options(path: &FieldPath, value: &Value) -> CoreResult<BTreeSet<RecordOption>> {
    let names: Vec<String> = match value {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_text().map(str::to_string).ok_or_else(|| {
                    CoreError::coercion(
                        path.canonical(),
                        format!("option names must be text, got {}", item.type_name()),
                    )
                })
            })
            .collect::<CoreResult<_>>()?,
        Value::Text(s) => s
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Null => Vec::new(),
        _ => return Err(shape_error(path, SchemaKind::OptionsSet, value)),
    };

    names
        .iter()
        .map(|name| {
            RecordOption::from_name(name).ok_or_else(|| {
                CoreError::coercion(path.canonical(), format!("unknown option {name:?}"))
            })
        })
        .collect()
}

fn coerce_offsets(path: &FieldPath, value: &Value) -> CoreResult<Vec<i64>> {
    let element = |item: &Value| -> CoreResult<i64> {
        let number = match item {
            Value::Integer(n) => Some(Number::Integer(*n)),
            Value::Float(f) => Some(Number::Float(*f)),
            Value::Text(s) => Number::parse(s),
            _ => None,
        };
        number.and_then(|n| n.as_integer()).ok_or_else(|| {
            CoreError::coercion(
                path.canonical(),
                format!("offset {} is not an integer", item.type_name()),
            )
        })
    };

    match value {
        Value::Array(items) => items.iter().map(element).collect(),
        Value::Null => Ok(Vec::new()),
        Value::Map(_) => Err(shape_error(path, SchemaKind::OffsetList, value)),
        scalar => Ok(vec![element(scalar)?]),
    }
}

fn coerce_entries(path: &FieldPath, value: &Value) -> CoreResult<Vec<String>> {
    match value {
        Value::Array(items) => items.iter().map(|item| coerce_text(path, item)).collect(),
        Value::Text(s) if s.is_empty() => Ok(Vec::new()),
        Value::Text(s) => Ok(s.lines().map(str::to_string).collect()),
        Value::Null => Ok(Vec::new()),
        _ => Err(shape_error(path, SchemaKind::EntryList, value)),
    }
}

fn coerce_script(path: &FieldPath, value: &Value) -> CoreResult<FieldWrite> {
    match value {
        Value::Text(body) => Ok(FieldWrite::Assign(FieldValue::Script(Some(body.clone())))),
        Value::Null => Ok(FieldWrite::Assign(FieldValue::Script(None))),
        Value::Map(_) => {
            let search = value
                .get("search")
                .and_then(Value::as_text)
                .ok_or_else(|| CoreError::coercion(path.canonical(), "missing search text"))?;
            let replace = value
                .get("replace")
                .and_then(Value::as_text)
                .ok_or_else(|| CoreError::coercion(path.canonical(), "missing replace text"))?;
            let count = match value.get("count") {
                None | Some(Value::Null) => 1,
                Some(v) => v
                    .as_integer()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| CoreError::coercion(path.canonical(), "invalid count"))?,
            };
            let pattern = value
                .get("pattern")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            Ok(FieldWrite::Substitute(ScriptSubstitution {
                search: search.to_string(),
                replace: replace.to_string(),
                count,
                pattern,
            }))
        }
        _ => Err(shape_error(path, SchemaKind::Script, value)),
    }
}
