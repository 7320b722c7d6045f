//! Signing client
//!
//! Obtains a signature from the node for a canonical payload. The node either
//! signs immediately or hands back a pending id that must be completed with a
//! password. The exchange is modelled as a state machine with two terminal
//! states so other multi-step backends slot in without nested conditionals.

use std::fmt;
use std::sync::Arc;

use agentseal_types::{Did, PendingSignature, Signature, SignOutcome, SigningError};

use crate::api::NodeApi;

/// Correlates an initial sign request with its password-based completion.
/// Lives for one sign operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningSession {
    pub pending: PendingSignature,
}

/// States of one sign operation
#[derive(Debug)]
pub enum SigningState {
    Requested,
    Pending(SigningSession),
    Signed(Signature),
    Failed(SigningError),
}

impl SigningState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SigningState::Signed(_) | SigningState::Failed(_))
    }
}

/// Stateless signing client, safe to share across concurrent exchanges
#[derive(Clone)]
pub struct SigningClient {
    node: Arc<dyn NodeApi>,
    password: String,
}

impl fmt::Debug for SigningClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningClient").finish_non_exhaustive()
    }
}

impl SigningClient {
    pub fn new(node: Arc<dyn NodeApi>, password: impl Into<String>) -> Self {
        Self {
            node,
            password: password.into(),
        }
    }

    /// Sign a canonical payload as `signer`. No retries.
    pub async fn sign(&self, canonical_payload: &str, signer: &Did) -> Result<Signature, SigningError> {
        let mut state = SigningState::Requested;
        loop {
            state = match state {
                SigningState::Signed(signature) => {
                    tracing::info!(signer = %signer, "Payload signed");
                    return Ok(signature);
                }
                SigningState::Failed(e) => {
                    tracing::warn!(signer = %signer, error = %e, "Signing failed");
                    return Err(e);
                }
                in_flight => self.step(in_flight, canonical_payload, signer).await,
            };
        }
    }

    /// Advance one transition.
    pub async fn step(&self, state: SigningState, canonical_payload: &str, signer: &Did) -> SigningState {
        match state {
            SigningState::Requested => match self.node.sign(signer, canonical_payload).await {
                Ok(SignOutcome::Signed(signature)) => SigningState::Signed(signature),
                Ok(SignOutcome::Pending(pending)) => {
                    tracing::debug!(id = %pending.id, mode = pending.mode, "Sign pending password exchange");
                    SigningState::Pending(SigningSession { pending })
                }
                Err(e) => SigningState::Failed(e.into()),
            },
            SigningState::Pending(session) => {
                match self.node.signature_response(&session.pending, &self.password).await {
                    Ok(response) => match response.signature.filter(|s| !s.is_empty()) {
                        Some(signature) => SigningState::Signed(Signature::new(signature)),
                        None => SigningState::Failed(SigningError::MissingSignature {
                            id: session.pending.id,
                        }),
                    },
                    Err(e) => SigningState::Failed(e.into()),
                }
            }
            terminal => terminal,
        }
    }
}
