//! Requester side: send, verify, anchor, report

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agentseal_core::{canonical_json, canonicalize, payload_digest, ReceiptAnchor, Verifier};
use agentseal_types::{
    AnchorStatus, Did, Envelope, ExchangeStatus, ExecuteRequest, TrustIssue, VerificationResult,
    VerifiedRecord,
};

use crate::error::TransportError;
use crate::message::TaskRequest;
use crate::transport::AgentTransport;

const VERIFIED: &str = "verified";
const POISONED: &str = "data poisoning detected";
const FAILED_SEND: &str = "Failed to send message";

/// Ledger parameters for anchoring exchange outcomes
#[derive(Debug, Clone)]
pub struct AnchorSettings {
    pub executor: Did,
    /// Token to execute against; anchoring is skipped without one
    pub token: Option<String>,
    pub value: i64,
    pub quorum_type: i64,
    pub receiver: String,
}

/// Everything the requester learned from one exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeOutcome {
    pub agent: String,
    pub messages: Vec<VerifiedRecord>,
    pub anchoring: AnchorStatus,
    pub trust_issues: Vec<TrustIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub status: ExchangeStatus,
    pub completed_at: DateTime<Utc>,
}

impl ExchangeOutcome {
    fn failed(agent: &str, error: String) -> Self {
        Self {
            agent: agent.to_string(),
            messages: Vec::new(),
            anchoring: AnchorStatus::Skipped,
            trust_issues: Vec::new(),
            status: ExchangeStatus::from_parts(&[], Some(error.as_str())),
            error: Some(error),
            completed_at: Utc::now(),
        }
    }

    pub fn user_message(&self) -> String {
        self.status.user_message()
    }
}

pub struct Requester {
    transport: Arc<dyn AgentTransport>,
    verifier: Verifier,
    anchor: ReceiptAnchor,
    settings: AnchorSettings,
}

impl Requester {
    pub fn new(
        transport: Arc<dyn AgentTransport>,
        verifier: Verifier,
        anchor: ReceiptAnchor,
        settings: AnchorSettings,
    ) -> Self {
        Self {
            transport,
            verifier,
            anchor,
            settings,
        }
    }

    /// Send `task` to `peer` and account for the signed reply.
    ///
    /// Verification always runs before anchoring. The anchor records the
    /// verdict, so a failed verification or a failed send is still anchored;
    /// a failed anchor is reported in [`ExchangeOutcome::anchoring`] and
    /// leaves the status alone. Only an unknown peer is never anchored.
    pub async fn exchange(&self, peer: &str, task: &str) -> ExchangeOutcome {
        let result = match self.transport.send(peer, TaskRequest::new(task)).await {
            Ok(result) => result,
            Err(e @ TransportError::UnknownPeer { .. }) => {
                tracing::warn!(peer, error = %e, "Exchange failed");
                return ExchangeOutcome::failed(peer, e.to_string());
            }
            Err(e) => {
                tracing::warn!(peer, error = %e, "Exchange failed");
                return self.failed_send(peer, task, e.to_string()).await;
            }
        };

        if !result.is_completed() {
            tracing::warn!(peer, error = ?result.error, "Peer did not complete the task");
            return self.failed_send(peer, task, FAILED_SEND.to_string()).await;
        }

        let verification = self.verifier.verify_fragments(peer, result.texts(), task).await;
        for issue in &verification.trust_issues {
            tracing::warn!(peer, issue = %issue, "Trust issue");
        }

        let anchoring = self.record(peer, task, &verification).await;

        ExchangeOutcome {
            agent: peer.to_string(),
            status: ExchangeStatus::from_parts(
                &verification.trust_issues,
                verification.error.as_deref(),
            ),
            messages: verification.records,
            anchoring,
            trust_issues: verification.trust_issues,
            error: verification.error,
            completed_at: Utc::now(),
        }
    }

    /// A reached peer that produced no reply is anchored as a poisoned outcome.
    async fn failed_send(&self, peer: &str, task: &str, error: String) -> ExchangeOutcome {
        let verification = VerificationResult {
            error: Some(error.clone()),
            ..Default::default()
        }
        .finalize();
        let anchoring = self.record(peer, task, &verification).await;

        ExchangeOutcome {
            anchoring,
            ..ExchangeOutcome::failed(peer, error)
        }
    }

    async fn record(&self, peer: &str, task: &str, verification: &VerificationResult) -> AnchorStatus {
        let Some(token) = self.settings.token.clone() else {
            tracing::debug!(peer, "No token configured, anchoring skipped");
            return AnchorStatus::Skipped;
        };

        let metadata = match anchor_metadata(task, verification) {
            Ok(metadata) => metadata,
            Err(message) => return AnchorStatus::Failed { message },
        };

        let request = ExecuteRequest {
            comment: format!("Auto-signing structured data after messaging {}", peer),
            executor: self.settings.executor.to_string(),
            nft: token,
            nft_data: metadata,
            nft_value: self.settings.value,
            quorum_type: self.settings.quorum_type,
            receiver: self.settings.receiver.clone(),
        };

        match self.anchor.execute_and_sign(&request).await {
            Ok(receipt) => AnchorStatus::Anchored(receipt),
            Err(e) => {
                tracing::warn!(peer, error = %e, "Anchoring failed");
                AnchorStatus::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}

/// Canonical record of what was asked and how the reply fared
fn anchor_metadata(task: &str, verification: &VerificationResult) -> Result<String, String> {
    let digests = verification
        .records
        .iter()
        .map(|r| {
            canonicalize(&Envelope::new(r.original.as_str(), r.response.as_str()))
                .map(|c| payload_digest(&c))
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;

    canonical_json(&serde_json::json!({
        "message": task,
        "verification_message": if verification.verified { VERIFIED } else { POISONED },
        "envelope_digests": digests,
    }))
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentseal_types::Signature;

    fn record() -> VerifiedRecord {
        VerifiedRecord {
            agent: "Bob_Agent".to_string(),
            response: "yes".to_string(),
            original: "q".to_string(),
            signature: Signature::from("abc"),
            signature_valid: true,
        }
    }

    #[test]
    fn test_metadata_for_verified_reply() {
        let verification = VerificationResult {
            records: vec![record()],
            ..Default::default()
        }
        .finalize();

        let metadata = anchor_metadata("q", &verification).unwrap();
        let digest = payload_digest(&canonicalize(&Envelope::new("q", "yes")).unwrap());
        assert_eq!(
            metadata,
            format!(
                r#"{{"envelope_digests":["{}"],"message":"q","verification_message":"verified"}}"#,
                digest
            )
        );
    }

    #[test]
    fn test_metadata_for_poisoned_reply() {
        let verification = VerificationResult {
            trust_issues: vec![TrustIssue::InvalidSignature],
            ..Default::default()
        }
        .finalize();

        let metadata = anchor_metadata("q", &verification).unwrap();
        assert_eq!(
            metadata,
            r#"{"envelope_digests":[],"message":"q","verification_message":"data poisoning detected"}"#
        );
    }

    #[test]
    fn test_failed_outcome_reads_as_error() {
        let outcome = ExchangeOutcome::failed("Nobody", "Agent Nobody not found".to_string());
        assert_eq!(outcome.user_message(), "Agent Nobody not found");
        assert_eq!(outcome.anchoring, AnchorStatus::Skipped);
    }
}
