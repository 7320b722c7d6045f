//! Scripted in-memory node for tests
//!
//! Each endpoint pops from its own queue of scripted results. Calls are
//! recorded in order so tests can assert on the exact protocol sequence.
//! With [`MockNode::deterministic`], unscripted sign/verify calls fall back
//! to a digest-based signature so a responder and a requester can talk to
//! the same mock end to end.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use agentseal_types::{
    CreateTokenRequest, DeployRequest, Did, ExecuteRequest, NodeError, PendingSignature,
    Signature, SignOutcome, SignatureResponse,
};

use crate::api::NodeApi;
use crate::canonical::payload_digest;

/// One recorded call against the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeCall {
    Sign { signer: Did, message: String },
    SignatureResponse { id: String, mode: i64, password: String },
    VerifySignature { signer: Did, signed_message: String, signature: Signature },
    CreateNft { did: String, metadata_name: String, artifact_name: String },
    DeployNft(DeployRequest),
    ExecuteNft(ExecuteRequest),
    DiscoverDid { index: usize },
}

#[derive(Default)]
struct Script {
    sign: VecDeque<Result<SignOutcome, NodeError>>,
    signature_response: VecDeque<Result<SignatureResponse, NodeError>>,
    verify: VecDeque<Result<bool, NodeError>>,
    create: VecDeque<Result<String, NodeError>>,
    deploy: VecDeque<Result<PendingSignature, NodeError>>,
    execute: VecDeque<Result<PendingSignature, NodeError>>,
    did: Option<Did>,
    deterministic: bool,
    calls: Vec<NodeCall>,
}

#[derive(Default)]
pub struct MockNode {
    script: Mutex<Script>,
}

fn unscripted(endpoint: &str) -> NodeError {
    NodeError::protocol(endpoint, "unscripted call")
}

/// Signature the deterministic mock issues for (signer, message)
pub fn deterministic_signature(signer: &Did, message: &str) -> Signature {
    Signature::new(payload_digest(format!("{}|{}", signer, message).as_bytes()))
}

impl MockNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sign and verify honestly when nothing is scripted.
    pub fn deterministic() -> Self {
        let node = Self::default();
        node.script.lock().deterministic = true;
        node
    }

    pub fn with_did(self, did: impl Into<Did>) -> Self {
        self.script.lock().did = Some(did.into());
        self
    }

    pub fn push_sign(&self, result: Result<SignOutcome, NodeError>) -> &Self {
        self.script.lock().sign.push_back(result);
        self
    }

    pub fn push_signature_response(&self, result: Result<SignatureResponse, NodeError>) -> &Self {
        self.script.lock().signature_response.push_back(result);
        self
    }

    pub fn push_verify(&self, result: Result<bool, NodeError>) -> &Self {
        self.script.lock().verify.push_back(result);
        self
    }

    pub fn push_create(&self, result: Result<String, NodeError>) -> &Self {
        self.script.lock().create.push_back(result);
        self
    }

    pub fn push_deploy(&self, result: Result<PendingSignature, NodeError>) -> &Self {
        self.script.lock().deploy.push_back(result);
        self
    }

    pub fn push_execute(&self, result: Result<PendingSignature, NodeError>) -> &Self {
        self.script.lock().execute.push_back(result);
        self
    }

    pub fn calls(&self) -> Vec<NodeCall> {
        self.script.lock().calls.clone()
    }

    /// Number of recorded calls matching `predicate`
    pub fn count(&self, predicate: impl Fn(&NodeCall) -> bool) -> usize {
        self.script.lock().calls.iter().filter(|c| predicate(c)).count()
    }
}

#[async_trait]
impl NodeApi for MockNode {
    async fn sign(&self, signer: &Did, message: &str) -> Result<SignOutcome, NodeError> {
        let mut script = self.script.lock();
        script.calls.push(NodeCall::Sign {
            signer: signer.clone(),
            message: message.to_string(),
        });
        match script.sign.pop_front() {
            Some(result) => result,
            None if script.deterministic => {
                Ok(SignOutcome::Signed(deterministic_signature(signer, message)))
            }
            None => Err(unscripted("sign")),
        }
    }

    async fn signature_response(
        &self,
        pending: &PendingSignature,
        password: &str,
    ) -> Result<SignatureResponse, NodeError> {
        let mut script = self.script.lock();
        script.calls.push(NodeCall::SignatureResponse {
            id: pending.id.clone(),
            mode: pending.mode,
            password: password.to_string(),
        });
        script
            .signature_response
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("signature-response")))
    }

    async fn verify_signature(
        &self,
        signer: &Did,
        signed_message: &str,
        signature: &Signature,
    ) -> Result<bool, NodeError> {
        let mut script = self.script.lock();
        script.calls.push(NodeCall::VerifySignature {
            signer: signer.clone(),
            signed_message: signed_message.to_string(),
            signature: signature.clone(),
        });
        match script.verify.pop_front() {
            Some(result) => result,
            None if script.deterministic => {
                Ok(deterministic_signature(signer, signed_message) == *signature)
            }
            None => Err(unscripted("verify-signature")),
        }
    }

    async fn create_nft(&self, request: CreateTokenRequest) -> Result<String, NodeError> {
        let mut script = self.script.lock();
        script.calls.push(NodeCall::CreateNft {
            did: request.did,
            metadata_name: request.metadata.file_name,
            artifact_name: request.artifact.file_name,
        });
        script.create.pop_front().unwrap_or_else(|| Err(unscripted("create-nft")))
    }

    async fn deploy_nft(&self, request: &DeployRequest) -> Result<PendingSignature, NodeError> {
        let mut script = self.script.lock();
        script.calls.push(NodeCall::DeployNft(request.clone()));
        script.deploy.pop_front().unwrap_or_else(|| Err(unscripted("deploy-nft")))
    }

    async fn execute_nft(&self, request: &ExecuteRequest) -> Result<PendingSignature, NodeError> {
        let mut script = self.script.lock();
        script.calls.push(NodeCall::ExecuteNft(request.clone()));
        script.execute.pop_front().unwrap_or_else(|| Err(unscripted("execute-nft")))
    }

    async fn discover_did(&self, index: usize) -> Result<Did, NodeError> {
        let mut script = self.script.lock();
        script.calls.push(NodeCall::DiscoverDid { index });
        script
            .did
            .clone()
            .ok_or_else(|| NodeError::protocol("get-by-node", "no DID in response"))
    }
}
