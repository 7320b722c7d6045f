//! agentseal Core - the trust envelope protocol
//!
//! A responder signs its reply, a requester verifies it and anchors the
//! outcome on a ledger:
//!
//! ```text
//! Envelope → canonicalize → SigningClient → build → SignedPayload
//!   → Verifier (signature, origin) → VerificationResult → ReceiptAnchor → Receipt
//! ```
//!
//! Canonicalization and building are pure. Signing, verification and
//! anchoring talk to the node through [`NodeApi`] and keep no state between
//! calls, so a single instance can serve concurrent exchanges.

pub mod api;
pub mod anchor;
pub mod builder;
pub mod canonical;
pub mod signer;
pub mod verifier;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use api::NodeApi;
pub use anchor::{MintRequest, ReceiptAnchor, TokenStore};
pub use builder::{build, seal, to_wire};
pub use canonical::{canonical_json, canonical_text, canonicalize, payload_digest};
pub use signer::{SigningClient, SigningSession, SigningState};
pub use verifier::{Verdict, Verifier};

pub use agentseal_types as types;
