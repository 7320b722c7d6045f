//! agentseal Types - Foundation types for the trust envelope protocol
//!
//! This crate has zero dependencies on other agentseal crates. It defines:
//!
//! - Identity types (`Did`, `Signature`)
//! - The signed unit exchanged between agents (`Envelope`, `SignedPayload`)
//! - Verification outcomes (`VerificationResult`, `TrustIssue`)
//! - Ledger receipts (`Receipt`, `MintReceipt`, `PendingSignature`)
//! - Wire types for the node REST API
//! - The error taxonomy shared by every layer
//!
//! # Flow
//!
//! ```text
//! reply → Envelope → canonical bytes → Signature → SignedPayload
//!       → (peer) verify → VerificationResult → anchor → Receipt
//! ```

pub mod identity;
pub mod envelope;
pub mod verification;
pub mod receipt;
pub mod wire;
pub mod error;

pub use identity::*;
pub use envelope::*;
pub use verification::*;
pub use receipt::*;
pub use wire::*;
pub use error::*;
