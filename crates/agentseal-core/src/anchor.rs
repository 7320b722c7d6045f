//! Receipt anchor
//!
//! Records verification outcomes on the node's ledger. Two flows:
//!
//! - create: `create-nft` → `deploy-nft` → `signature-response`
//! - execute: `execute-nft` → `signature-response`
//!
//! Every step is fatal on failure. Nothing is rolled back (the ledger is
//! append-only) and nothing is retried: each call creates a new entry, so a
//! blind retry can double-anchor.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use agentseal_types::{
    AnchorError, AnchorStep, CreateTokenRequest, DeployRequest, Did, ExecuteRequest, FileUpload,
    MintReceipt, PendingSignature, Receipt,
};

use crate::api::NodeApi;
use crate::canonical::canonical_json;

/// Inputs of the create flow
#[derive(Debug, Clone)]
pub struct MintRequest {
    pub did: Did,
    pub metadata_path: PathBuf,
    pub artifact_path: PathBuf,
    pub nft_data: String,
    pub nft_value: i64,
    pub quorum_type: i64,
}

#[derive(Clone)]
pub struct ReceiptAnchor {
    node: Arc<dyn NodeApi>,
    password: String,
}

impl ReceiptAnchor {
    pub fn new(node: Arc<dyn NodeApi>, password: impl Into<String>) -> Self {
        Self {
            node,
            password: password.into(),
        }
    }

    /// Mint a token from a metadata file and an artifact, deploy it, sign the deployment.
    pub async fn mint_deploy_and_sign(&self, request: &MintRequest) -> Result<MintReceipt, AnchorError> {
        let metadata_bytes = read_file(&request.metadata_path).await?;
        let artifact_bytes = read_file(&request.artifact_path).await?;

        let metadata_value: serde_json::Value = serde_json::from_slice(&metadata_bytes)
            .map_err(|e| AnchorError::Metadata {
                message: e.to_string(),
            })?;
        let nft_metadata = canonical_json(&metadata_value).map_err(|e| AnchorError::Metadata {
            message: e.message,
        })?;
        let artifact_name = file_name(&request.artifact_path);

        let token = self
            .node
            .create_nft(CreateTokenRequest {
                did: request.did.to_string(),
                metadata: FileUpload::json(file_name(&request.metadata_path), metadata_bytes),
                artifact: FileUpload::binary(artifact_name.clone(), artifact_bytes),
            })
            .await
            .map_err(AnchorError::at(AnchorStep::Create))?;
        tracing::info!(token = %token, "Token created");

        let pending = self
            .node
            .deploy_nft(&DeployRequest {
                did: request.did.to_string(),
                nft: token.clone(),
                nft_data: request.nft_data.clone(),
                nft_file_name: artifact_name,
                nft_metadata,
                nft_value: request.nft_value,
                quorum_type: request.quorum_type,
            })
            .await
            .map_err(AnchorError::at(AnchorStep::Deploy))?;
        tracing::debug!(id = %pending.id, mode = pending.mode, "Deployment staged");

        let signature = self.complete(&pending).await?;
        tracing::info!(token = %token, "Token deployed and signed");

        Ok(MintReceipt { token, signature })
    }

    /// Execute against an existing token and sign the execution.
    pub async fn execute_and_sign(&self, request: &ExecuteRequest) -> Result<Receipt, AnchorError> {
        let pending = self
            .node
            .execute_nft(request)
            .await
            .map_err(AnchorError::at(AnchorStep::Execute))?;
        tracing::debug!(id = %pending.id, mode = pending.mode, "Execution staged");

        let signature = self.complete(&pending).await?;
        tracing::info!(token = %request.nft, id = %pending.id, "Execution anchored");

        Ok(Receipt {
            id: pending.id,
            mode: pending.mode,
            signature,
        })
    }

    async fn complete(&self, pending: &PendingSignature) -> Result<String, AnchorError> {
        let response = self
            .node
            .signature_response(pending, &self.password)
            .await
            .map_err(AnchorError::at(AnchorStep::Sign))?;

        response
            .message
            .ok_or(AnchorError::MissingSignature {
                step: AnchorStep::Sign,
            })
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>, AnchorError> {
    tokio::fs::read(path).await.map_err(|e| AnchorError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// File-backed cache of a previously minted token
///
/// A requester mints its ledger token once and reuses it on later runs.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached token, if any. A missing or blank file means none.
    pub async fn load(&self) -> Result<Option<String>, AnchorError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AnchorError::Io {
                path: self.path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }

    pub async fn save(&self, token: &str) -> Result<(), AnchorError> {
        tokio::fs::write(&self.path, token).await.map_err(|e| AnchorError::Io {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Reuse the cached token or run the create flow and cache the result.
    pub async fn ensure_token(
        &self,
        anchor: &ReceiptAnchor,
        request: &MintRequest,
    ) -> Result<String, AnchorError> {
        if let Some(token) = self.load().await? {
            tracing::info!(token = %token, path = %self.path.display(), "Using cached token");
            return Ok(token);
        }

        let receipt = anchor.mint_deploy_and_sign(request).await?;
        self.save(&receipt.token).await?;
        tracing::info!(token = %receipt.token, path = %self.path.display(), "Minted and cached token");
        Ok(receipt.token)
    }
}
