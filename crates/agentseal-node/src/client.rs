//! reqwest implementation of the node API

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use agentseal_core::NodeApi;
use agentseal_types::{
    CreateTokenRequest, DeployRequest, Did, ExecuteRequest, FileUpload, NodeDetails, NodeError,
    NodeReply, PendingSignature, Signature, SignOutcome, SignRequest, SignatureResponse,
    SignatureResponseRequest, VerifySignatureQuery,
};

use crate::config::NodeConfig;

const SIGN: &str = "sign";
const SIGNATURE_RESPONSE: &str = "signature-response";
const VERIFY_SIGNATURE: &str = "verify-signature";
const CREATE_NFT: &str = "create-nft";
const DEPLOY_NFT: &str = "deploy-nft";
const EXECUTE_NFT: &str = "execute-nft";
const GET_BY_NODE: &str = "get-by-node";

/// HTTP client for one node
#[derive(Debug, Clone)]
pub struct NodeClient {
    base_url: String,
    client: reqwest::Client,
}

impl NodeClient {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: std::time::Duration) -> Result<Self, NodeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NodeError::Configuration {
                message: e.to_string(),
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create a client from configuration, resolving the base URL for `role`.
    pub fn from_config(
        config: &NodeConfig,
        role: Option<&str>,
        env_override: Option<&str>,
    ) -> Result<Self, NodeError> {
        Self::new(&config.resolve_base_url(role, env_override), config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/{}", self.base_url, endpoint)
    }

    /// Read a `{status, message, result}` body, requiring `status: true`.
    async fn accepted(endpoint: &str, response: reqwest::Response) -> Result<NodeReply, NodeError> {
        let reply: NodeReply = read_json(endpoint, response).await?;
        if !reply.status {
            return Err(NodeError::rejected(endpoint, reply.message));
        }
        Ok(reply)
    }

    async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<NodeReply, NodeError> {
        let response = self
            .client
            .post(self.url(endpoint))
            .json(body)
            .send()
            .await
            .map_err(transport(endpoint))?;
        Self::accepted(endpoint, response).await
    }
}

fn transport(endpoint: &str) -> impl Fn(reqwest::Error) -> NodeError {
    let endpoint = endpoint.to_string();
    move |e| NodeError::Transport {
        endpoint: endpoint.clone(),
        message: if e.is_timeout() {
            format!("timed out: {}", e)
        } else {
            e.to_string()
        },
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    endpoint: &str,
    response: reqwest::Response,
) -> Result<T, NodeError> {
    let status = response.status();
    if !status.is_success() {
        return Err(NodeError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = response.bytes().await.map_err(|e| NodeError::Transport {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })?;
    serde_json::from_slice(&bytes)
        .map_err(|e| NodeError::protocol(endpoint, format!("invalid JSON: {}", e)))
}

/// `{id, mode}` out of a reply's `result`
fn pending_from(endpoint: &str, result: Option<serde_json::Value>) -> Result<PendingSignature, NodeError> {
    let value = result.unwrap_or(serde_json::Value::Null);
    let obj = value
        .as_object()
        .ok_or_else(|| NodeError::protocol(endpoint, format!("unexpected result field: {}", value)))?;

    let id = match obj.get("id") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => return Err(NodeError::protocol(endpoint, format!("result has no id: {}", value))),
    };
    let mode = obj.get("mode").and_then(|m| m.as_i64());

    Ok(PendingSignature {
        id,
        mode: mode.unwrap_or_default(),
    })
}

fn file_part(endpoint: &str, upload: FileUpload) -> Result<Part, NodeError> {
    Part::bytes(upload.bytes)
        .file_name(upload.file_name)
        .mime_str(&upload.content_type)
        .map_err(|e| NodeError::protocol(endpoint, e.to_string()))
}

#[async_trait]
impl NodeApi for NodeClient {
    async fn sign(&self, signer: &Did, message: &str) -> Result<SignOutcome, NodeError> {
        tracing::debug!(signer = %signer, "POST /api/sign");
        let reply = self
            .post_json(
                SIGN,
                &SignRequest {
                    signer_did: signer.to_string(),
                    msg_to_sign: message.to_string(),
                },
            )
            .await?;

        match reply.result {
            Some(serde_json::Value::String(signature)) => Ok(SignOutcome::Signed(Signature::new(signature))),
            Some(result @ serde_json::Value::Object(_)) => {
                pending_from(SIGN, Some(result)).map(SignOutcome::Pending)
            }
            other => Err(NodeError::protocol(
                SIGN,
                format!("unexpected sign response: {}", other.unwrap_or_default()),
            )),
        }
    }

    async fn signature_response(
        &self,
        pending: &PendingSignature,
        password: &str,
    ) -> Result<SignatureResponse, NodeError> {
        tracing::debug!(id = %pending.id, mode = pending.mode, "POST /api/signature-response");
        let reply = self
            .post_json(
                SIGNATURE_RESPONSE,
                &SignatureResponseRequest {
                    id: pending.id.clone(),
                    mode: pending.mode,
                    password: password.to_string(),
                },
            )
            .await?;

        let signature = reply
            .result
            .as_ref()
            .and_then(|r| r.get("signature"))
            .and_then(|s| s.as_str())
            .map(str::to_string);

        Ok(SignatureResponse {
            message: reply.message,
            signature,
        })
    }

    async fn verify_signature(
        &self,
        signer: &Did,
        signed_message: &str,
        signature: &Signature,
    ) -> Result<bool, NodeError> {
        tracing::debug!(signer = %signer, "GET /api/verify-signature");
        let response = self
            .client
            .get(self.url(VERIFY_SIGNATURE))
            .query(&VerifySignatureQuery {
                signer_did: signer.to_string(),
                signed_msg: signed_message.to_string(),
                signature: signature.to_string(),
            })
            .send()
            .await
            .map_err(transport(VERIFY_SIGNATURE))?;

        let reply: NodeReply = read_json(VERIFY_SIGNATURE, response).await?;
        Ok(reply.status)
    }

    async fn create_nft(&self, request: CreateTokenRequest) -> Result<String, NodeError> {
        tracing::debug!(did = %request.did, artifact = %request.artifact.file_name, "POST /api/create-nft");
        let form = Form::new()
            .text("did", request.did)
            .part("metadata", file_part(CREATE_NFT, request.metadata)?)
            .part("artifact", file_part(CREATE_NFT, request.artifact)?);

        let response = self
            .client
            .post(self.url(CREATE_NFT))
            .multipart(form)
            .send()
            .await
            .map_err(transport(CREATE_NFT))?;

        match Self::accepted(CREATE_NFT, response).await?.result {
            Some(serde_json::Value::String(token)) => Ok(token),
            other => Err(NodeError::protocol(
                CREATE_NFT,
                format!("unexpected result field: {}", other.unwrap_or_default()),
            )),
        }
    }

    async fn deploy_nft(&self, request: &DeployRequest) -> Result<PendingSignature, NodeError> {
        tracing::debug!(nft = %request.nft, "POST /api/deploy-nft");
        let reply = self.post_json(DEPLOY_NFT, request).await?;
        require_mode(DEPLOY_NFT, &reply)?;
        pending_from(DEPLOY_NFT, reply.result)
    }

    async fn execute_nft(&self, request: &ExecuteRequest) -> Result<PendingSignature, NodeError> {
        tracing::debug!(nft = %request.nft, executor = %request.executor, "POST /api/execute-nft");
        let reply = self.post_json(EXECUTE_NFT, request).await?;
        require_mode(EXECUTE_NFT, &reply)?;
        pending_from(EXECUTE_NFT, reply.result)
    }

    async fn discover_did(&self, index: usize) -> Result<Did, NodeError> {
        let response = self
            .client
            .get(self.url(GET_BY_NODE))
            .send()
            .await
            .map_err(transport(GET_BY_NODE))?;

        let details: NodeDetails = read_json(GET_BY_NODE, response).await?;
        details
            .did_at(index)
            .map(Did::from)
            .ok_or_else(|| NodeError::protocol(GET_BY_NODE, format!("no DID at index {}", index)))
    }
}

/// Ledger operations must report both `id` and `mode`.
fn require_mode(endpoint: &str, reply: &NodeReply) -> Result<(), NodeError> {
    let has_mode = reply
        .result
        .as_ref()
        .and_then(|r| r.get("mode"))
        .is_some();
    if has_mode {
        Ok(())
    } else {
        Err(NodeError::protocol(endpoint, "result has no mode"))
    }
}
