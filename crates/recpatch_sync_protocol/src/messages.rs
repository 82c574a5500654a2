//! Patch request and response messages.

use crate::error::{ProtocolError, ProtocolResult};
use crate::patch::WirePatch;
use recpatch_core::{Fingerprint, PatchSet, PatchSetStatus};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Response status. `ok`, `up-to-date` and `hash-mismatch` are known;
/// anything else is carried verbatim.
pub type ResponseStatus = PatchSetStatus;

/// Request for the patch set that applies to the client's current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchRequest {
    /// Version of the client asking.
    pub client_version: String,
    /// Fingerprint of the client's record store.
    pub fingerprint: String,
}

impl PatchRequest {
    /// Creates a new request.
    pub fn new(client_version: impl Into<String>, fingerprint: &Fingerprint) -> Self {
        Self {
            client_version: client_version.into(),
            fingerprint: fingerprint.to_string(),
        }
    }

    /// Encodes to JSON.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(ProtocolError::encoding)
    }

    /// Decodes from JSON.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        serde_json::from_slice(bytes).map_err(ProtocolError::decoding)
    }
}

/// Answer to a [`PatchRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchResponse {
    /// Outcome.
    #[serde(serialize_with = "status_to_str", deserialize_with = "status_from_str")]
    pub status: ResponseStatus,
    /// Version the patches bring the client to.
    #[serde(default)]
    pub target_version: String,
    /// Fingerprint the patches were authored against; empty if none.
    #[serde(default)]
    pub required_hash: String,
    /// Fingerprint expected after applying; empty if none.
    #[serde(default)]
    pub new_hash: String,
    /// Patches in application order.
    #[serde(default)]
    pub patches: Vec<WirePatch>,
}

impl PatchResponse {
    /// Creates an `ok` response.
    pub fn ok(
        target_version: impl Into<String>,
        required_hash: impl Into<String>,
        new_hash: impl Into<String>,
        patches: Vec<WirePatch>,
    ) -> Self {
        Self {
            status: PatchSetStatus::Ok,
            target_version: target_version.into(),
            required_hash: required_hash.into(),
            new_hash: new_hash.into(),
            patches,
        }
    }

    /// Creates an `up-to-date` response.
    pub fn up_to_date(target_version: impl Into<String>) -> Self {
        Self::with_status(PatchSetStatus::UpToDate, target_version)
    }

    /// Creates a `hash-mismatch` response.
    pub fn hash_mismatch(target_version: impl Into<String>) -> Self {
        Self::with_status(PatchSetStatus::HashMismatch, target_version)
    }

    fn with_status(status: PatchSetStatus, target_version: impl Into<String>) -> Self {
        Self {
            status,
            target_version: target_version.into(),
            required_hash: String::new(),
            new_hash: String::new(),
            patches: Vec::new(),
        }
    }

    /// Builds an `ok` response from a core patch set.
    pub fn from_patch_set(target_version: impl Into<String>, set: &PatchSet) -> Self {
        Self {
            status: set.status.clone(),
            target_version: target_version.into(),
            required_hash: set
                .required_fingerprint
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            new_hash: set
                .new_fingerprint
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            patches: set.patches.iter().map(WirePatch::from).collect(),
        }
    }

    /// Converts to a core patch set. Empty hashes become `None`.
    pub fn to_patch_set(&self) -> ProtocolResult<PatchSet> {
        let patches = self
            .patches
            .iter()
            .map(WirePatch::to_patch)
            .collect::<ProtocolResult<Vec<_>>>()?;
        Ok(PatchSet {
            status: self.status.clone(),
            required_fingerprint: non_empty(&self.required_hash),
            new_fingerprint: non_empty(&self.new_hash),
            patches,
        })
    }

    /// Encodes to JSON.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(ProtocolError::encoding)
    }

    /// Decodes from JSON.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        serde_json::from_slice(bytes).map_err(ProtocolError::decoding)
    }
}

fn non_empty(hash: &str) -> Option<Fingerprint> {
    let hash = hash.trim();
    (!hash.is_empty()).then(|| Fingerprint::new(hash))
}

fn status_to_str<S: Serializer>(status: &ResponseStatus, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(status.as_str())
}

fn status_from_str<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ResponseStatus, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(PatchSetStatus::parse(&raw))
}
