//! Per-kind field accessors over a single record.
//!
//! These are the only functions that touch record fields by path. The
//! snapshot store, differ, applier and reverter all go through them, so
//! whatever is read can be written back unchanged.

use super::model::{Record, VarType};
use crate::error::{CoreError, CoreResult};
use crate::schema::{FieldPath, FieldValue};
use recpatch_codec::{Number, Value};

/// Reads one field of a record.
pub fn read_field(record: &Record, path: &FieldPath) -> CoreResult<FieldValue> {
    let value = match path {
        FieldPath::Description => FieldValue::Text(record.description.clone()),
        FieldPath::Address => FieldValue::Text(record.address.clone()),
        FieldPath::Type => FieldValue::Number(Number::Integer(record.var_type.code())),
        FieldPath::Value => FieldValue::Number(record.value),
        FieldPath::Active => FieldValue::Bool(record.active),
        FieldPath::ShowAsHex => FieldValue::Bool(record.show_as_hex),
        FieldPath::ShowAsSigned => FieldValue::Bool(record.show_as_signed),
        FieldPath::Color => FieldValue::Number(Number::Integer(record.color)),
        FieldPath::Options => FieldValue::Options(record.options.clone()),
        FieldPath::Offsets => FieldValue::Offsets(record.offsets.clone()),
        FieldPath::OffsetAt(i) => match record.offsets.get(*i) {
            Some(&offset) => FieldValue::Number(Number::Integer(offset)),
            None => {
                return Err(CoreError::write(
                    record.id.as_u64(),
                    path.canonical(),
                    format!("offset index {i} out of range ({})", record.offsets.len()),
                ))
            }
        },
        FieldPath::OffsetCount => FieldValue::Number(Number::Integer(record.offsets.len() as i64)),
        FieldPath::DropDownList => FieldValue::Entries(record.dropdown.clone()),
        FieldPath::Script => FieldValue::Script(record.script.clone()),
        FieldPath::Custom(name) => FieldValue::Raw(record.extra.get(name).cloned().unwrap_or_default()),
    };
    Ok(value)
}

/// Writes one field of a record.
///
/// The value must already have the kind of the path; anything else is a
/// schema error. Writing `null` to a custom field removes it.
pub fn write_field(record: &mut Record, path: &FieldPath, value: &FieldValue) -> CoreResult<()> {
    let id = record.id.as_u64();
    match (path, value) {
        (FieldPath::Description, FieldValue::Text(s)) => record.description = s.clone(),
        (FieldPath::Address, FieldValue::Text(s)) => record.address = s.clone(),
        (FieldPath::Type, FieldValue::Number(n)) => {
            record.var_type = n
                .as_integer()
                .and_then(VarType::from_code)
                .ok_or_else(|| CoreError::write(id, path.canonical(), format!("unknown type code {n}")))?;
        }
        (FieldPath::Value, FieldValue::Number(n)) => record.value = *n,
        (FieldPath::Active, FieldValue::Bool(b)) => record.active = *b,
        (FieldPath::ShowAsHex, FieldValue::Bool(b)) => record.show_as_hex = *b,
        (FieldPath::ShowAsSigned, FieldValue::Bool(b)) => record.show_as_signed = *b,
        (FieldPath::Color, FieldValue::Number(n)) => {
            record.color = integral(id, path, n)?;
        }
        (FieldPath::Options, FieldValue::Options(set)) => record.options = set.clone(),
        (FieldPath::Offsets, FieldValue::Offsets(list)) => record.offsets = list.clone(),
        (FieldPath::OffsetAt(i), FieldValue::Number(n)) => {
            let offset = integral(id, path, n)?;
            let len = record.offsets.len();
            match (*i).cmp(&len) {
                std::cmp::Ordering::Less => record.offsets[*i] = offset,
                std::cmp::Ordering::Equal => record.offsets.push(offset),
                std::cmp::Ordering::Greater => {
                    return Err(CoreError::write(
                        id,
                        path.canonical(),
                        format!("offset index {i} out of range ({len})"),
                    ))
                }
            }
        }
        (FieldPath::OffsetCount, FieldValue::Number(n)) => {
            let count = usize::try_from(integral(id, path, n)?).map_err(|_| {
                CoreError::write(id, path.canonical(), "offset count cannot be negative")
            })?;
            record.offsets.resize(count, 0);
        }
        (FieldPath::DropDownList, FieldValue::Entries(list)) => record.dropdown = list.clone(),
        (FieldPath::Script, FieldValue::Script(body)) => record.script = body.clone(),
        (FieldPath::Custom(name), FieldValue::Raw(Value::Null)) => {
            record.extra.remove(name);
        }
        (FieldPath::Custom(name), FieldValue::Raw(v)) => {
            record.extra.insert(name.clone(), v.clone());
        }
        (path, value) => {
            return Err(CoreError::schema(
                path.canonical(),
                format!("cannot store a {} value", value.kind()),
            ))
        }
    }
    Ok(())
}

fn integral(id: u64, path: &FieldPath, n: &Number) -> CoreResult<i64> {
    n.as_integer()
        .ok_or_else(|| CoreError::write(id, path.canonical(), format!("{n} is not an integer")))
}
