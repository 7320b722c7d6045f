//! Envelope builder
//!
//! Pure construction of [`SignedPayload`]s, plus the responder-side
//! convenience that canonicalizes, signs and builds in one step.

use agentseal_types::{Did, EncodingError, Envelope, Signature, SignedPayload, SigningError};

use crate::canonical::{canonical_json, canonical_text};
use crate::signer::SigningClient;

/// Wrap an envelope, signer and signature into a transmissible payload.
pub fn build(
    original_message: impl Into<String>,
    response: impl Into<String>,
    signer: Did,
    signature: Signature,
) -> Result<SignedPayload, EncodingError> {
    let payload = SignedPayload {
        agent: signer,
        envelope: Envelope::new(original_message, response),
        signature,
    };
    // Fail here rather than at transmit time.
    canonical_json(&payload)?;
    Ok(payload)
}

/// Canonical wire text for a signed payload
pub fn to_wire(payload: &SignedPayload) -> Result<String, EncodingError> {
    canonical_json(payload)
}

/// Canonicalize, sign and build.
pub async fn seal(
    envelope: Envelope,
    signer: &SigningClient,
    identity: &Did,
) -> Result<SignedPayload, SigningError> {
    let canonical = canonical_text(&envelope)?;
    let signature = signer.sign(&canonical, identity).await?;
    Ok(build(
        envelope.original_message,
        envelope.response,
        identity.clone(),
        signature,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{deterministic_signature, MockNode};
    use std::sync::Arc;

    #[test]
    fn test_build_and_wire_form() {
        let payload = build("q", "a", Did::from("did:x"), Signature::from("abc")).unwrap();
        assert_eq!(payload.envelope, Envelope::new("q", "a"));
        assert_eq!(
            to_wire(&payload).unwrap(),
            r#"{"agent":"did:x","envelope":{"original_message":"q","response":"a"},"signature":"abc"}"#
        );
    }

    #[tokio::test]
    async fn test_seal_signs_canonical_envelope() {
        let node = Arc::new(MockNode::deterministic());
        let client = SigningClient::new(node, "pw");
        let identity = Did::from("did:responder");

        let payload = seal(Envelope::new("q", "a"), &client, &identity).await.unwrap();

        let canonical = r#"{"original_message":"q","response":"a"}"#;
        assert_eq!(payload.agent, identity);
        assert_eq!(payload.signature, deterministic_signature(&identity, canonical));
    }
}
