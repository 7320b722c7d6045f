//! agentseal A2A - signed agent-to-agent exchanges
//!
//! A [`Requester`] sends a task to a named peer over an [`AgentTransport`].
//! The peer's [`Responder`] answers with its reply text and a signed
//! envelope binding that reply to the task. The requester verifies the
//! envelope, records the verdict on the ledger and reports an
//! [`ExchangeOutcome`].

pub mod error;
pub mod message;
pub mod requester;
pub mod responder;
pub mod transport;

pub use error::{ReplyError, ResponderError, TransportError};
pub use message::{Artifact, Part, Role, TaskRequest, TaskResult, TaskState};
pub use requester::{AnchorSettings, ExchangeOutcome, Requester};
pub use responder::{ReplyGenerator, Responder, StaticReply};
pub use transport::{AgentTransport, InProcTransport};
