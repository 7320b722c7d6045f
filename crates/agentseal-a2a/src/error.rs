//! Exchange errors

use std::time::Duration;

use agentseal_types::{EncodingError, SigningError};
use thiserror::Error;

/// Delivery failures between agents
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Agent {peer} not found")]
    UnknownPeer { peer: String },

    #[error("Agent {peer} did not answer within {after:?}")]
    Timeout { peer: String, after: Duration },

    #[error("Delivery to {peer} failed: {message}")]
    Delivery { peer: String, message: String },
}

/// The reply source could not produce an answer
#[derive(Debug, Error)]
#[error("reply generation failed: {message}")]
pub struct ReplyError {
    pub message: String,
}

impl ReplyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ResponderError {
    #[error(transparent)]
    Reply(#[from] ReplyError),

    #[error("signing failed: {0}")]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}
