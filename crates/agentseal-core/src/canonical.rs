//! Canonical serialization
//!
//! Canonical form is compact JSON with object keys in sorted order. Going
//! through `serde_json::Value` gives the ordering: its map is a `BTreeMap`
//! unless `preserve_order` is enabled, which this workspace never does.

use serde::Serialize;
use sha2::{Digest, Sha256};

use agentseal_types::{EncodingError, Envelope};

/// Canonical JSON text for any serializable value
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String, EncodingError> {
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&value)?)
}

/// Bytes signed and verified for an envelope
pub fn canonicalize(envelope: &Envelope) -> Result<Vec<u8>, EncodingError> {
    canonical_json(envelope).map(String::into_bytes)
}

/// Canonical envelope as text, the form the node signs
pub fn canonical_text(envelope: &Envelope) -> Result<String, EncodingError> {
    canonical_json(envelope)
}

/// SHA-256 hex digest of a canonical payload
pub fn payload_digest(canonical: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical);
    hex::encode(hasher.finalize())
}
