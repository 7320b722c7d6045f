//! End-to-end exchanges over the in-process transport

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use agentseal_a2a::{
    AgentTransport, AnchorSettings, ExchangeOutcome, InProcTransport, Part, Requester, Responder,
    StaticReply, TaskRequest, TaskResult, TransportError,
};
use agentseal_core::testing::{MockNode, NodeCall};
use agentseal_core::{ReceiptAnchor, SigningClient, Verifier};
use agentseal_types::{
    AnchorStatus, Did, ExchangeStatus, Fragment, NodeError, PendingSignature, SignatureResponse,
    SignedPayload, TrustIssue,
};

const ASKED: &str = "Are you available 2024-08-01 to 2024-08-03?";
const ANSWER: &str = "Yes, Bob is free on those dates.";

struct Harness {
    bob_node: Arc<MockNode>,
    host_node: Arc<MockNode>,
}

impl Harness {
    fn new() -> Self {
        Self {
            bob_node: Arc::new(MockNode::deterministic()),
            host_node: Arc::new(MockNode::deterministic()),
        }
    }

    fn bob(&self) -> Arc<Responder> {
        Arc::new(Responder::new(
            "Bob_Agent",
            Did::from("did:bob"),
            SigningClient::new(self.bob_node.clone(), "bob-pw"),
            Arc::new(StaticReply::new(ANSWER)),
        ))
    }

    fn transport(&self) -> Arc<dyn AgentTransport> {
        Arc::new(InProcTransport::new(Duration::from_secs(5)).with_responder(self.bob()))
    }

    fn requester(&self, transport: Arc<dyn AgentTransport>, token: Option<&str>) -> Requester {
        Requester::new(
            transport,
            Verifier::new(self.host_node.clone()),
            ReceiptAnchor::new(self.host_node.clone(), "host-pw"),
            AnchorSettings {
                executor: Did::from("did:host"),
                token: token.map(str::to_string),
                value: 1,
                quorum_type: 2,
                receiver: String::new(),
            },
        )
    }

    fn script_anchor_ok(&self) {
        self.host_node
            .push_execute(Ok(PendingSignature {
                id: "e-1".to_string(),
                mode: 2,
            }))
            .push_signature_response(Ok(SignatureResponse {
                message: Some("3044anchor".to_string()),
                ..Default::default()
            }));
    }

    fn executed(&self) -> Vec<agentseal_types::ExecuteRequest> {
        self.host_node
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                NodeCall::ExecuteNft(request) => Some(request),
                _ => None,
            })
            .collect()
    }
}

/// Rewrites the signed reply in flight
struct Tampering {
    inner: Arc<dyn AgentTransport>,
}

#[async_trait]
impl AgentTransport for Tampering {
    async fn send(&self, peer: &str, request: TaskRequest) -> Result<TaskResult, TransportError> {
        let mut result = self.inner.send(peer, request).await?;
        for artifact in &mut result.artifacts {
            for part in &mut artifact.parts {
                let Part::Text { text } = part;
                if let Fragment::Signed(mut payload) = SignedPayload::parse_fragment(text) {
                    payload.envelope.response = "No, Bob is busy.".to_string();
                    *text = serde_json::to_string(&payload).unwrap();
                }
            }
        }
        Ok(result)
    }

    fn peers(&self) -> Vec<String> {
        self.inner.peers()
    }
}

#[tokio::test]
async fn test_honest_exchange_is_verified_and_anchored() {
    let harness = Harness::new();
    harness.script_anchor_ok();
    let requester = harness.requester(harness.transport(), Some("QmToken"));

    let outcome = requester.exchange("Bob_Agent", ASKED).await;

    assert_eq!(outcome.status, ExchangeStatus::Verified);
    assert_eq!(outcome.user_message(), "All messages verified successfully");
    assert_eq!(outcome.messages.len(), 1);
    assert_eq!(outcome.messages[0].agent, "Bob_Agent");
    assert_eq!(outcome.messages[0].response, ANSWER);
    assert_eq!(outcome.messages[0].original, ASKED);

    let receipt = outcome.anchoring.receipt().expect("anchored");
    assert_eq!(receipt.id, "e-1");
    assert_eq!(receipt.signature, "3044anchor");

    let executed = harness.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(
        executed[0].comment,
        "Auto-signing structured data after messaging Bob_Agent"
    );
    assert_eq!(executed[0].nft, "QmToken");
    assert_eq!(executed[0].executor, "did:host");
    assert!(executed[0].nft_data.contains(r#""verification_message":"verified""#));

    // Signed before sending, verified before anchoring.
    assert_eq!(harness.bob_node.count(|c| matches!(c, NodeCall::Sign { .. })), 1);
    let host_calls = harness.host_node.calls();
    assert!(matches!(host_calls[0], NodeCall::VerifySignature { .. }));
    assert!(matches!(host_calls[1], NodeCall::ExecuteNft(_)));
    assert!(matches!(host_calls[2], NodeCall::SignatureResponse { .. }));
}

#[tokio::test]
async fn test_tampered_reply_is_flagged_and_anchored_as_poisoned() {
    let harness = Harness::new();
    harness.script_anchor_ok();
    let transport = Arc::new(Tampering {
        inner: harness.transport(),
    });
    let requester = harness.requester(transport, Some("QmToken"));

    let outcome = requester.exchange("Bob_Agent", ASKED).await;

    assert_eq!(outcome.trust_issues, vec![TrustIssue::InvalidSignature]);
    assert!(outcome.messages.is_empty());
    assert_eq!(
        outcome.user_message(),
        "Trust issues detected: Invalid signature"
    );
    assert!(harness.executed()[0]
        .nft_data
        .contains("data poisoning detected"));
}

#[tokio::test]
async fn test_anchoring_failure_keeps_verified_status() {
    let harness = Harness::new();
    harness.host_node.push_execute(Err(NodeError::Status {
        endpoint: "execute-nft".to_string(),
        status: 500,
    }));
    let requester = harness.requester(harness.transport(), Some("QmToken"));

    let outcome = requester.exchange("Bob_Agent", ASKED).await;

    assert!(outcome.status.is_verified());
    assert!(matches!(outcome.anchoring, AnchorStatus::Failed { .. }));
    assert_eq!(
        harness
            .host_node
            .count(|c| matches!(c, NodeCall::SignatureResponse { .. })),
        0
    );
}

#[tokio::test]
async fn test_no_token_skips_anchoring() {
    let harness = Harness::new();
    let requester = harness.requester(harness.transport(), None);

    let outcome = requester.exchange("Bob_Agent", ASKED).await;

    assert!(outcome.status.is_verified());
    assert_eq!(outcome.anchoring, AnchorStatus::Skipped);
    assert!(harness.executed().is_empty());
}

#[tokio::test]
async fn test_unknown_peer_is_an_error_outcome() {
    let harness = Harness::new();
    let requester = harness.requester(harness.transport(), Some("QmToken"));

    let outcome = requester.exchange("Carol_Agent", ASKED).await;

    assert_eq!(outcome.error.as_deref(), Some("Agent Carol_Agent not found"));
    assert_eq!(outcome.user_message(), "Agent Carol_Agent not found");
    assert_eq!(outcome.anchoring, AnchorStatus::Skipped);
    assert!(harness.host_node.calls().is_empty());
}

#[tokio::test]
async fn test_responder_signing_failure_is_anchored_as_poisoned() {
    let harness = Harness::new();
    harness.script_anchor_ok();
    harness.bob_node.push_sign(Err(NodeError::Transport {
        endpoint: "sign".to_string(),
        message: "connection refused".to_string(),
    }));
    let requester = harness.requester(harness.transport(), Some("QmToken"));

    let outcome = requester.exchange("Bob_Agent", ASKED).await;

    assert_eq!(outcome.status, ExchangeStatus::Error("Failed to send message".to_string()));
    assert!(outcome.messages.is_empty());
    assert_eq!(outcome.anchoring.receipt().map(|r| r.id.as_str()), Some("e-1"));

    let executed = harness.executed();
    assert_eq!(executed.len(), 1);
    assert!(executed[0].nft_data.contains(r#""verification_message":"data poisoning detected""#));
    assert!(executed[0].nft_data.contains(r#""envelope_digests":[]"#));
    assert_eq!(
        harness
            .host_node
            .count(|c| matches!(c, NodeCall::VerifySignature { .. })),
        0
    );
}

#[tokio::test]
async fn test_failed_send_without_token_is_not_anchored() {
    let harness = Harness::new();
    harness.bob_node.push_sign(Err(NodeError::Transport {
        endpoint: "sign".to_string(),
        message: "connection refused".to_string(),
    }));
    let requester = harness.requester(harness.transport(), None);

    let outcome = requester.exchange("Bob_Agent", ASKED).await;

    assert_eq!(outcome.user_message(), "Failed to send message");
    assert_eq!(outcome.anchoring, AnchorStatus::Skipped);
    assert!(harness.host_node.calls().is_empty());
}

#[tokio::test]
async fn test_verification_transport_error_is_not_a_trust_issue() {
    let harness = Harness::new();
    harness.script_anchor_ok();
    harness.host_node.push_verify(Err(NodeError::Transport {
        endpoint: "verify-signature".to_string(),
        message: "timed out".to_string(),
    }));
    let requester = harness.requester(harness.transport(), Some("QmToken"));

    let outcome = requester.exchange("Bob_Agent", ASKED).await;

    assert!(outcome.trust_issues.is_empty());
    assert!(matches!(outcome.status, ExchangeStatus::Error(ref e) if e.contains("timed out")));
}

#[tokio::test]
async fn test_concurrent_exchanges_share_one_requester() {
    let harness = Harness::new();
    let requester = Arc::new(harness.requester(harness.transport(), None));

    let tasks: Vec<_> = (0..4)
        .map(|i| {
            let requester = requester.clone();
            tokio::spawn(async move {
                requester
                    .exchange("Bob_Agent", &format!("Are you free on day {}?", i))
                    .await
            })
        })
        .collect();

    let mut outcomes: Vec<ExchangeOutcome> = Vec::new();
    for task in tasks {
        outcomes.push(task.await.unwrap());
    }

    assert!(outcomes.iter().all(|o| o.status.is_verified()));
    assert_eq!(harness.bob_node.count(|c| matches!(c, NodeCall::Sign { .. })), 4);
}
