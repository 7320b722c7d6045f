//! Envelope and signed payload types
//!
//! An [`Envelope`] pairs the message a responder received with the reply it
//! produced. The responder signs the canonical form of the envelope and ships
//! the result as a [`SignedPayload`] alongside its ordinary reply text.

use serde::{Deserialize, Deserializer, Serialize};

use crate::{Did, Signature};

/// The signed unit `{original_message, response}`
///
/// Field order here is irrelevant to signing: canonicalization sorts keys.
/// Exactly these two fields are signed. An envelope carrying any other key
/// is rejected on input, so a fragment holding one reads as content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    /// The task text the responder was asked
    pub original_message: String,
    /// The responder's reply
    pub response: String,
}

impl Envelope {
    pub fn new(original_message: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            original_message: original_message.into(),
            response: response.into(),
        }
    }
}

/// Keys a JSON fragment must carry to be treated as a signed payload
pub const SIGNED_PAYLOAD_KEYS: [&str; 3] = ["agent", "envelope", "signature"];

/// A signed envelope as transmitted between agents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPayload {
    /// Identity that produced the signature
    pub agent: Did,
    /// The envelope that was signed (accepts a stringified JSON envelope on input)
    #[serde(deserialize_with = "envelope_or_json_string")]
    pub envelope: Envelope,
    /// Signature over the canonical envelope bytes
    pub signature: Signature,
}

/// Outcome of inspecting one reply fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// A well-formed signed payload
    Signed(SignedPayload),
    /// Anything else: plain text, unrelated JSON, or a payload of the wrong shape
    Content,
}

impl SignedPayload {
    /// Classify a reply fragment.
    ///
    /// A fragment only counts as a signed payload when it is a JSON object
    /// carrying all of [`SIGNED_PAYLOAD_KEYS`] with the expected shapes.
    pub fn parse_fragment(text: &str) -> Fragment {
        let value: serde_json::Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(_) => return Fragment::Content,
        };

        let Some(obj) = value.as_object() else {
            return Fragment::Content;
        };
        if !SIGNED_PAYLOAD_KEYS.iter().all(|k| obj.contains_key(*k)) {
            return Fragment::Content;
        }

        match serde_json::from_value::<SignedPayload>(value) {
            Ok(payload) => Fragment::Signed(payload),
            Err(_) => Fragment::Content,
        }
    }
}

fn envelope_or_json_string<'de, D>(deserializer: D) -> Result<Envelope, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Object(Envelope),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Object(envelope) => Ok(envelope),
        Raw::Text(text) => serde_json::from_str(&text).map_err(serde::de::Error::custom),
    }
}
