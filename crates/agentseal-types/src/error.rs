//! Error types for agentseal
//!
//! Remote failures are explicit values carrying the endpoint that failed.
//! Trust violations are not errors; see [`crate::TrustIssue`].

use thiserror::Error;

use crate::AnchorStep;

/// Canonicalization failure
#[derive(Debug, Clone, Error)]
#[error("Encoding error: {message}")]
pub struct EncodingError {
    pub message: String,
}

impl EncodingError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for EncodingError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(e.to_string())
    }
}

/// Failure talking to the node REST API
#[derive(Debug, Clone, Error)]
pub enum NodeError {
    /// Network failure or timeout
    #[error("HTTP error during {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// Non-success HTTP status
    #[error("HTTP error during {endpoint}: status {status}")]
    Status { endpoint: String, status: u16 },

    /// Body was not JSON or had an unexpected shape
    #[error("Unexpected response from {endpoint}: {message}")]
    Protocol { endpoint: String, message: String },

    /// Node answered with `status: false`
    #[error("{endpoint} returned error: {message}")]
    Rejected { endpoint: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl NodeError {
    pub fn protocol(endpoint: &str, message: impl Into<String>) -> Self {
        NodeError::Protocol {
            endpoint: endpoint.to_string(),
            message: message.into(),
        }
    }

    pub fn rejected(endpoint: &str, message: Option<String>) -> Self {
        NodeError::Rejected {
            endpoint: endpoint.to_string(),
            message: message.unwrap_or_else(|| "<no message>".to_string()),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, NodeError::Transport { .. } | NodeError::Status { .. })
    }
}

/// Failure obtaining a signature
#[derive(Debug, Clone, Error)]
pub enum SigningError {
    #[error("Signing failed: {0}")]
    Node(#[from] NodeError),

    #[error("Signing failed: signature-response for {id} carried no signature")]
    MissingSignature { id: String },

    #[error("Signing failed: {0}")]
    Encoding(#[from] EncodingError),
}

/// Failure in a ledger anchoring flow
#[derive(Debug, Clone, Error)]
pub enum AnchorError {
    #[error("Anchoring failed at {step}: {source}")]
    Step { step: AnchorStep, source: NodeError },

    #[error("Anchoring failed at {step}: no signature in response")]
    MissingSignature { step: AnchorStep },

    #[error("Cannot read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid metadata: {message}")]
    Metadata { message: String },
}

impl AnchorError {
    pub fn at(step: AnchorStep) -> impl FnOnce(NodeError) -> AnchorError {
        move |source| AnchorError::Step { step, source }
    }

    /// The step that failed, when the failure came from the node
    pub fn step(&self) -> Option<AnchorStep> {
        match self {
            AnchorError::Step { step, .. } | AnchorError::MissingSignature { step } => Some(*step),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_without_message() {
        let err = NodeError::rejected("deploy-nft", None);
        assert_eq!(err.to_string(), "deploy-nft returned error: <no message>");
    }

    #[test]
    fn test_anchor_error_names_step() {
        let err = AnchorError::at(AnchorStep::Deploy)(NodeError::Status {
            endpoint: "deploy-nft".to_string(),
            status: 500,
        });
        assert_eq!(err.step(), Some(AnchorStep::Deploy));
        assert!(err.to_string().contains("deploy-nft"));
        assert!(err.to_string().contains("500"));
    }
}
