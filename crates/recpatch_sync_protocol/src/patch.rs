//! Patch wire format.
//!
//! ```json
//! {"ID": "1", "Target": {"Index": 0, "ID": 4, "Description": "Health"},
//!  "Op": "set", "Path": "Offset", "Value": [16, 8]}
//! ```

use crate::error::{ProtocolError, ProtocolResult};
use recpatch_codec::Value;
use recpatch_core::{Patch, RecordId, TargetSpec};
use serde::{Deserialize, Deserializer, Serialize};

/// Record locators as sent on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTarget {
    /// Zero-based pre-order index.
    #[serde(rename = "Index", default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    /// Record ID.
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Record description.
    #[serde(
        rename = "Description",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
}

impl WireTarget {
    /// Converts to a core target spec.
    pub fn to_target(&self) -> ProtocolResult<TargetSpec> {
        let index = self
            .index
            .map(|i| {
                usize::try_from(i)
                    .map_err(|_| ProtocolError::invalid_field("Target.Index", format!("{i} is negative")))
            })
            .transpose()?;
        let id = self
            .id
            .map(|raw| match u64::try_from(raw) {
                Ok(n) if n > 0 => Ok(RecordId::new(n)),
                _ => Err(ProtocolError::invalid_field(
                    "Target.ID",
                    format!("{raw} is not a record id"),
                )),
            })
            .transpose()?;
        Ok(TargetSpec {
            index,
            id,
            description: self.description.clone(),
        })
    }
}

impl From<&TargetSpec> for WireTarget {
    fn from(target: &TargetSpec) -> Self {
        Self {
            index: target.index.and_then(|i| i64::try_from(i).ok()),
            id: target.id.and_then(|id| i64::try_from(id.as_u64()).ok()),
            description: target.description.clone(),
        }
    }
}

/// A patch as sent on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirePatch {
    /// Patch ID. Numeric IDs are accepted and kept as text.
    #[serde(rename = "ID", deserialize_with = "id_as_text")]
    pub id: String,
    /// Record locators.
    #[serde(rename = "Target", default)]
    pub target: WireTarget,
    /// Operation; absent means `set`.
    #[serde(rename = "Op", default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
    /// Field path.
    #[serde(rename = "Path")]
    pub path: String,
    /// New value.
    #[serde(rename = "Value", default)]
    pub value: Value,
}

impl WirePatch {
    /// Converts to a core patch.
    pub fn to_patch(&self) -> ProtocolResult<Patch> {
        Ok(Patch {
            id: self.id.clone(),
            target: self.target.to_target()?,
            op: self.op.clone(),
            path: self.path.clone(),
            value: self.value.clone(),
        })
    }
}

impl From<&Patch> for WirePatch {
    fn from(patch: &Patch) -> Self {
        Self {
            id: patch.id.clone(),
            target: WireTarget::from(&patch.target),
            op: patch.op.clone(),
            path: patch.path.clone(),
            value: patch.value.clone(),
        }
    }
}

fn id_as_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Integer(i64),
    }

    Ok(match Repr::deserialize(deserializer)? {
        Repr::Text(s) => s,
        Repr::Integer(n) => n.to_string(),
    })
}
