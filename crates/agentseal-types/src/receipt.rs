//! Ledger receipts
//!
//! Receipts are created once per anchoring operation and never mutated.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A node operation awaiting a password-based signature
///
/// Returned by sign (password flow), deploy and execute. `mode` selects the
/// follow-up signing flow on the node side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSignature {
    pub id: String,
    #[serde(default)]
    pub mode: i64,
}

/// Result of the execute flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: String,
    pub mode: i64,
    pub signature: String,
}

/// Result of the create flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintReceipt {
    pub token: String,
    pub signature: String,
}

/// Steps of the anchoring flows, used to name the failing step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorStep {
    Create,
    Deploy,
    Execute,
    Sign,
}

impl fmt::Display for AnchorStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnchorStep::Create => "create-nft",
            AnchorStep::Deploy => "deploy-nft",
            AnchorStep::Execute => "execute-nft",
            AnchorStep::Sign => "signature-response",
        };
        f.write_str(name)
    }
}

/// What happened when the requester tried to anchor an exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnchorStatus {
    Anchored(Receipt),
    Failed { message: String },
    /// Nothing anchored: no ledger token configured, or the peer was never reached
    Skipped,
}

impl AnchorStatus {
    pub fn receipt(&self) -> Option<&Receipt> {
        match self {
            AnchorStatus::Anchored(r) => Some(r),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_mode_defaults_to_zero() {
        let pending: PendingSignature = serde_json::from_str(r#"{"id": "tx-1"}"#).unwrap();
        assert_eq!(pending.mode, 0);
    }

    #[test]
    fn test_anchor_status_shape() {
        let status = AnchorStatus::Anchored(Receipt {
            id: "tx-1".to_string(),
            mode: 4,
            signature: "sig".to_string(),
        });
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "anchored");
        assert_eq!(json["id"], "tx-1");
        assert_eq!(status.receipt().map(|r| r.mode), Some(4));
    }
}
