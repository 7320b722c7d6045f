//! Verification outcomes
//!
//! Trust violations are values, not errors: the requester always gets a
//! [`VerificationResult`] back and decides how to surface it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Signature;

/// A detected violation surfaced to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrustIssue {
    /// The node rejected the signature for (signer, canonical payload)
    InvalidSignature,
    /// The envelope answers a different question than the one sent
    OriginMismatch { expected: String, actual: String },
    /// The reply carried no envelope that survived verification
    NoValidEnvelope,
}

impl fmt::Display for TrustIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustIssue::InvalidSignature => write!(f, "Invalid signature"),
            TrustIssue::OriginMismatch { expected, actual } => {
                write!(f, "Original mismatch: expected '{}', got '{}'", expected, actual)
            }
            TrustIssue::NoValidEnvelope => write!(f, "No valid envelope response"),
        }
    }
}

/// An accepted envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedRecord {
    /// Requester-side name of the peer the task was sent to
    pub agent: String,
    pub response: String,
    pub original: String,
    pub signature: Signature,
    pub signature_valid: bool,
}

/// Aggregate verification outcome for one reply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verified: bool,
    pub records: Vec<VerifiedRecord>,
    pub trust_issues: Vec<TrustIssue>,
    /// Transport or protocol failure that aborted verification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerificationResult {
    /// Apply the aggregate rules once every fragment has been processed.
    pub fn finalize(mut self) -> Self {
        if self.records.is_empty() && self.error.is_none() && self.trust_issues.is_empty() {
            self.trust_issues.push(TrustIssue::NoValidEnvelope);
        }
        self.verified =
            !self.records.is_empty() && self.trust_issues.is_empty() && self.error.is_none();
        self
    }

    pub fn issue_messages(&self) -> Vec<String> {
        self.trust_issues.iter().map(|i| i.to_string()).collect()
    }
}

/// User-visible status of an exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ExchangeStatus {
    TrustIssues(Vec<String>),
    Error(String),
    Verified,
}

impl ExchangeStatus {
    /// Trust issues win over errors; only a clean exchange reads as verified.
    pub fn from_parts(trust_issues: &[TrustIssue], error: Option<&str>) -> Self {
        if !trust_issues.is_empty() {
            ExchangeStatus::TrustIssues(trust_issues.iter().map(|i| i.to_string()).collect())
        } else if let Some(e) = error {
            ExchangeStatus::Error(e.to_string())
        } else {
            ExchangeStatus::Verified
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, ExchangeStatus::Verified)
    }

    /// Message relayed to the user as-is. On trust issues nothing further is asked.
    pub fn user_message(&self) -> String {
        match self {
            ExchangeStatus::TrustIssues(issues) => {
                format!("Trust issues detected: {}", issues.join("; "))
            }
            ExchangeStatus::Error(e) => e.clone(),
            ExchangeStatus::Verified => "All messages verified successfully".to_string(),
        }
    }
}
