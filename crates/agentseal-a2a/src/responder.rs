//! Responder side: answer a task and sign the answer

use std::sync::Arc;

use async_trait::async_trait;

use agentseal_core::{seal, to_wire, SigningClient};
use agentseal_types::{Did, Envelope};

use crate::error::{ReplyError, ResponderError};
use crate::message::{Artifact, Part, TaskRequest, TaskResult};

/// Source of reply text for a task
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn reply(&self, task: &str) -> Result<String, ReplyError>;
}

/// Always answers with the same text
#[derive(Debug, Clone)]
pub struct StaticReply(pub String);

impl StaticReply {
    pub fn new(reply: impl Into<String>) -> Self {
        Self(reply.into())
    }
}

#[async_trait]
impl ReplyGenerator for StaticReply {
    async fn reply(&self, _task: &str) -> Result<String, ReplyError> {
        Ok(self.0.clone())
    }
}

/// A named agent that signs every reply it sends
pub struct Responder {
    name: String,
    identity: Did,
    signer: SigningClient,
    generator: Arc<dyn ReplyGenerator>,
}

impl Responder {
    pub fn new(
        name: impl Into<String>,
        identity: Did,
        signer: SigningClient,
        generator: Arc<dyn ReplyGenerator>,
    ) -> Self {
        Self {
            name: name.into(),
            identity,
            signer,
            generator,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identity(&self) -> &Did {
        &self.identity
    }

    /// Answer `request`. The artifact carries the plain reply followed by the
    /// signed envelope; any failure yields a failed task instead.
    pub async fn handle(&self, request: &TaskRequest) -> TaskResult {
        match self.respond(&request.text()).await {
            Ok(parts) => {
                tracing::info!(agent = %self.name, task_id = %request.task_id, "Signed reply sent");
                TaskResult::completed(request, vec![Artifact { parts }])
            }
            Err(e) => {
                tracing::warn!(agent = %self.name, task_id = %request.task_id, error = %e, "Task failed");
                TaskResult::failed(request, e.to_string())
            }
        }
    }

    async fn respond(&self, task: &str) -> Result<Vec<Part>, ResponderError> {
        let reply = self.generator.reply(task).await?;
        let payload = seal(Envelope::new(task, reply.clone()), &self.signer, &self.identity).await?;
        let wire = to_wire(&payload)?;
        Ok(vec![Part::text(reply), Part::text(wire)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentseal_core::testing::{deterministic_signature, MockNode};
    use agentseal_core::canonical_text;
    use agentseal_types::{Fragment, NodeError, SignedPayload};

    struct Failing;

    #[async_trait]
    impl ReplyGenerator for Failing {
        async fn reply(&self, _task: &str) -> Result<String, ReplyError> {
            Err(ReplyError::new("model offline"))
        }
    }

    fn responder(node: Arc<MockNode>, generator: Arc<dyn ReplyGenerator>) -> Responder {
        Responder::new(
            "Bob_Agent",
            Did::from("did:bob"),
            SigningClient::new(node, "pw"),
            generator,
        )
    }

    #[tokio::test]
    async fn test_reply_and_envelope_parts() {
        let node = Arc::new(MockNode::deterministic());
        let bob = responder(node, Arc::new(StaticReply::new("Yes, I am free.")));

        let request = TaskRequest::new("Are you free?");
        let result = bob.handle(&request).await;

        assert!(result.is_completed());
        let texts: Vec<&str> = result.texts().collect();
        assert_eq!(texts[0], "Yes, I am free.");

        let payload = match SignedPayload::parse_fragment(texts[1]) {
            Fragment::Signed(p) => p,
            Fragment::Content => panic!("second part must be a signed payload"),
        };
        assert_eq!(payload.envelope, Envelope::new("Are you free?", "Yes, I am free."));
        let canonical = canonical_text(&payload.envelope).unwrap();
        assert_eq!(payload.signature, deterministic_signature(&Did::from("did:bob"), &canonical));
    }

    #[tokio::test]
    async fn test_signing_failure_fails_the_task() {
        let node = Arc::new(MockNode::new());
        node.push_sign(Err(NodeError::Transport {
            endpoint: "sign".to_string(),
            message: "connection refused".to_string(),
        }));
        let bob = responder(node, Arc::new(StaticReply::new("yes")));

        let result = bob.handle(&TaskRequest::new("q")).await;

        assert!(!result.is_completed());
        assert!(result.artifacts.is_empty());
        assert!(result.error.unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_reply_failure_skips_signing() {
        let node = Arc::new(MockNode::deterministic());
        let bob = responder(node.clone(), Arc::new(Failing));

        let result = bob.handle(&TaskRequest::new("q")).await;

        assert!(!result.is_completed());
        assert!(node.calls().is_empty());
    }
}
