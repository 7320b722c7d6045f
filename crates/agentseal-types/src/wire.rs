//! Wire types for the node REST API
//!
//! Field names match the node's JSON contract exactly; do not rename.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{PendingSignature, Signature};

/// Common reply body: `{status, message?, result?}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeReply {
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

/// POST /api/sign
#[derive(Debug, Clone, Serialize)]
pub struct SignRequest {
    pub signer_did: String,
    pub msg_to_sign: String,
}

/// What /api/sign handed back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignOutcome {
    /// Signature returned immediately
    Signed(Signature),
    /// Signer requires a password exchange first
    Pending(PendingSignature),
}

/// POST /api/signature-response
#[derive(Clone, Serialize)]
pub struct SignatureResponseRequest {
    pub id: String,
    pub mode: i64,
    pub password: String,
}

impl fmt::Debug for SignatureResponseRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureResponseRequest")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of a successful /api/signature-response
///
/// The sign flow reads `result.signature`; the ledger flows read `message`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureResponse {
    pub message: Option<String>,
    pub signature: Option<String>,
}

/// GET /api/verify-signature query
#[derive(Debug, Clone, Serialize)]
pub struct VerifySignatureQuery {
    pub signer_did: String,
    pub signed_msg: String,
    pub signature: String,
}

/// A file part for the multipart create call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn json(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: "application/json".to_string(),
            bytes,
        }
    }

    pub fn binary(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: "application/octet-stream".to_string(),
            bytes,
        }
    }
}

/// POST /api/create-nft (multipart)
#[derive(Debug, Clone)]
pub struct CreateTokenRequest {
    pub did: String,
    pub metadata: FileUpload,
    pub artifact: FileUpload,
}

/// POST /api/deploy-nft
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployRequest {
    pub did: String,
    pub nft: String,
    pub nft_data: String,
    pub nft_file_name: String,
    pub nft_metadata: String,
    pub nft_value: i64,
    pub quorum_type: i64,
}

/// POST /api/execute-nft
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecuteRequest {
    pub comment: String,
    pub executor: String,
    pub nft: String,
    pub nft_data: String,
    pub nft_value: i64,
    pub quorum_type: i64,
    pub receiver: String,
}

/// GET /api/get-by-node
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeDetails {
    #[serde(rename = "TxnCount", default)]
    pub txn_count: Option<Vec<NodeAccount>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeAccount {
    #[serde(rename = "DID", default)]
    pub did: Option<String>,
}

impl NodeDetails {
    /// DID of the account at `index`, if the node reported one
    pub fn did_at(&self, index: usize) -> Option<&str> {
        self.txn_count
            .as_ref()
            .and_then(|accounts| accounts.get(index))
            .and_then(|account| account.did.as_deref())
    }
}
