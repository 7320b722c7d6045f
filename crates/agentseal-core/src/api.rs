//! The node seam
//!
//! Every remote collaborator of the trust protocol sits behind [`NodeApi`].
//! `agentseal-node` provides the HTTP implementation; tests use a scripted one.

use async_trait::async_trait;

use agentseal_types::{
    CreateTokenRequest, DeployRequest, Did, ExecuteRequest, NodeError, PendingSignature,
    Signature, SignOutcome, SignatureResponse,
};

/// Operations the node REST API exposes to this workspace
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// POST /api/sign
    async fn sign(&self, signer: &Did, message: &str) -> Result<SignOutcome, NodeError>;

    /// POST /api/signature-response
    async fn signature_response(
        &self,
        pending: &PendingSignature,
        password: &str,
    ) -> Result<SignatureResponse, NodeError>;

    /// GET /api/verify-signature
    async fn verify_signature(
        &self,
        signer: &Did,
        signed_message: &str,
        signature: &Signature,
    ) -> Result<bool, NodeError>;

    /// POST /api/create-nft, returns the minted token
    async fn create_nft(&self, request: CreateTokenRequest) -> Result<String, NodeError>;

    /// POST /api/deploy-nft
    async fn deploy_nft(&self, request: &DeployRequest) -> Result<PendingSignature, NodeError>;

    /// POST /api/execute-nft
    async fn execute_nft(&self, request: &ExecuteRequest) -> Result<PendingSignature, NodeError>;

    /// GET /api/get-by-node, DID of the account at `index`
    async fn discover_did(&self, index: usize) -> Result<Did, NodeError>;
}
