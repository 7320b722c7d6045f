//! Verifier
//!
//! Checks the signed payloads embedded in a peer's reply. Each fragment goes
//! through structure → signature → origin; the first failing check records a
//! trust issue and drops that fragment, and processing moves on to the next.

use std::sync::Arc;

use agentseal_types::{
    Fragment, NodeError, SignedPayload, TrustIssue, VerificationResult, VerifiedRecord,
};

use crate::api::NodeApi;
use crate::canonical::canonical_text;

/// Result of checking one payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted(VerifiedRecord),
    Rejected(TrustIssue),
}

#[derive(Clone)]
pub struct Verifier {
    node: Arc<dyn NodeApi>,
}

impl Verifier {
    pub fn new(node: Arc<dyn NodeApi>) -> Self {
        Self { node }
    }

    /// Check one payload against the message actually sent.
    ///
    /// `peer` is the requester-side name recorded on an accepted record.
    pub async fn verify(
        &self,
        peer: &str,
        payload: &SignedPayload,
        expected_original_message: &str,
    ) -> Result<Verdict, NodeError> {
        let canonical = canonical_text(&payload.envelope)
            .map_err(|e| NodeError::protocol("verify-signature", e.to_string()))?;

        let valid = self
            .node
            .verify_signature(&payload.agent, &canonical, &payload.signature)
            .await?;
        if !valid {
            tracing::warn!(peer, signer = %payload.agent, "Invalid signature");
            return Ok(Verdict::Rejected(TrustIssue::InvalidSignature));
        }

        if payload.envelope.original_message != expected_original_message {
            tracing::warn!(peer, signer = %payload.agent, "Envelope answers a different message");
            return Ok(Verdict::Rejected(TrustIssue::OriginMismatch {
                expected: expected_original_message.to_string(),
                actual: payload.envelope.original_message.clone(),
            }));
        }

        Ok(Verdict::Accepted(VerifiedRecord {
            agent: peer.to_string(),
            response: payload.envelope.response.clone(),
            original: payload.envelope.original_message.clone(),
            signature: payload.signature.clone(),
            signature_valid: true,
        }))
    }

    /// Check every fragment of one reply and aggregate.
    ///
    /// Fragments that are not signed payloads are ordinary content and are
    /// skipped. A remote failure aborts the remaining fragments.
    pub async fn verify_fragments<'a, I>(
        &self,
        peer: &str,
        fragments: I,
        expected_original_message: &str,
    ) -> VerificationResult
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut result = VerificationResult::default();

        for text in fragments {
            let payload = match SignedPayload::parse_fragment(text) {
                Fragment::Signed(p) => p,
                Fragment::Content => continue,
            };

            match self.verify(peer, &payload, expected_original_message).await {
                Ok(Verdict::Accepted(record)) => result.records.push(record),
                Ok(Verdict::Rejected(issue)) => result.trust_issues.push(issue),
                Err(e) => {
                    tracing::warn!(peer, error = %e, "Verification aborted");
                    result.error = Some(e.to_string());
                    break;
                }
            }
        }

        let result = result.finalize();
        tracing::info!(
            peer,
            verified = result.verified,
            records = result.records.len(),
            issues = result.trust_issues.len(),
            "Verification complete"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build, to_wire};
    use crate::testing::{MockNode, NodeCall};
    use agentseal_types::{Did, Signature};

    const ASKED: &str = "Are you available 2024-08-01 to 2024-08-03?";

    fn wire(original: &str, response: &str) -> String {
        let payload = build(original, response, Did::from("did:x"), Signature::from("abc")).unwrap();
        to_wire(&payload).unwrap()
    }

    fn verifier(node: &Arc<MockNode>) -> Verifier {
        Verifier::new(node.clone())
    }

    #[tokio::test]
    async fn test_valid_envelope_is_accepted() {
        let node = Arc::new(MockNode::new());
        node.push_verify(Ok(true));

        let fragment = wire(ASKED, "yes 8/2");
        let result = verifier(&node)
            .verify_fragments("Bob_Agent", ["yes 8/2", fragment.as_str()], ASKED)
            .await;

        assert!(result.verified);
        assert!(result.trust_issues.is_empty());
        assert_eq!(result.records.len(), 1);
        let record = &result.records[0];
        assert_eq!(record.agent, "Bob_Agent");
        assert_eq!(record.response, "yes 8/2");
        assert_eq!(record.original, ASKED);
        assert_eq!(record.signature.as_str(), "abc");
        assert!(record.signature_valid);
    }

    #[tokio::test]
    async fn test_verification_uses_canonical_envelope_text() {
        let node = Arc::new(MockNode::new());
        node.push_verify(Ok(true));

        let fragment = wire(ASKED, "yes 8/2");
        verifier(&node).verify_fragments("Bob_Agent", [fragment.as_str()], ASKED).await;

        let expected = format!(r#"{{"original_message":"{}","response":"yes 8/2"}}"#, ASKED);
        assert_eq!(
            node.calls(),
            vec![NodeCall::VerifySignature {
                signer: Did::from("did:x"),
                signed_message: expected,
                signature: Signature::from("abc"),
            }]
        );
    }

    #[tokio::test]
    async fn test_invalid_signature_is_rejected_even_with_matching_origin() {
        let node = Arc::new(MockNode::new());
        node.push_verify(Ok(false));

        let fragment = wire(ASKED, "yes 8/2");
        let result = verifier(&node)
            .verify_fragments("Bob_Agent", [fragment.as_str()], ASKED)
            .await;

        assert!(!result.verified);
        assert!(result.records.is_empty());
        assert_eq!(result.issue_messages(), vec!["Invalid signature".to_string()]);
    }

    #[tokio::test]
    async fn test_origin_substitution_is_caught() {
        let node = Arc::new(MockNode::new());
        node.push_verify(Ok(true));

        let fragment = wire("different question", "yes 8/2");
        let result = verifier(&node)
            .verify_fragments("Bob_Agent", [fragment.as_str()], ASKED)
            .await;

        assert!(result.records.is_empty());
        assert_eq!(result.trust_issues.len(), 1);
        let message = result.trust_issues[0].to_string();
        assert!(message.starts_with("Original mismatch"));
        assert!(message.contains(ASKED));
        assert!(message.contains("different question"));
    }

    #[tokio::test]
    async fn test_ordinary_content_is_not_a_trust_issue() {
        let node = Arc::new(MockNode::new());
        let partial = serde_json::json!({"agent": "did:x", "envelope": {}}).to_string();

        let result = verifier(&node)
            .verify_fragments("Bob_Agent", ["plain reply", partial.as_str(), "{not json"], ASKED)
            .await;

        assert!(node.calls().is_empty());
        assert!(result.records.is_empty());
        // Only the aggregate rule fires.
        assert_eq!(result.trust_issues, vec![TrustIssue::NoValidEnvelope]);
    }

    #[tokio::test]
    async fn test_no_fragments_reports_no_valid_envelope() {
        let node = Arc::new(MockNode::new());
        let result = verifier(&node)
            .verify_fragments("Bob_Agent", std::iter::empty::<&str>(), ASKED)
            .await;
        assert_eq!(result.issue_messages(), vec!["No valid envelope response".to_string()]);
    }

    #[tokio::test]
    async fn test_mixed_fragments_keep_processing() {
        let node = Arc::new(MockNode::new());
        node.push_verify(Ok(false)).push_verify(Ok(true));

        let bad = wire(ASKED, "tampered");
        let good = wire(ASKED, "yes 8/2");
        let result = verifier(&node)
            .verify_fragments("Bob_Agent", [bad.as_str(), good.as_str()], ASKED)
            .await;

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.trust_issues, vec![TrustIssue::InvalidSignature]);
        assert!(!result.verified);
    }

    #[tokio::test]
    async fn test_transport_error_aborts_and_is_not_a_trust_issue() {
        let node = Arc::new(MockNode::new());
        node.push_verify(Err(NodeError::Transport {
            endpoint: "verify-signature".to_string(),
            message: "timed out".to_string(),
        }));

        let first = wire(ASKED, "a");
        let second = wire(ASKED, "b");
        let result = verifier(&node)
            .verify_fragments("Bob_Agent", [first.as_str(), second.as_str()], ASKED)
            .await;

        assert_eq!(node.calls().len(), 1);
        assert!(result.trust_issues.is_empty());
        assert!(result.error.as_deref().unwrap_or_default().contains("timed out"));
        assert!(!result.verified);
    }
}
