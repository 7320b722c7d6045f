//! Delivery of tasks to named peers

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::message::{TaskRequest, TaskResult};
use crate::responder::Responder;

#[async_trait]
pub trait AgentTransport: Send + Sync {
    async fn send(&self, peer: &str, request: TaskRequest) -> Result<TaskResult, TransportError>;

    /// Names of reachable peers
    fn peers(&self) -> Vec<String>;
}

/// Routes tasks to responders living in the same process
pub struct InProcTransport {
    responders: HashMap<String, Arc<Responder>>,
    timeout: Duration,
}

impl InProcTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            responders: HashMap::new(),
            timeout,
        }
    }

    /// Register a responder under its own name, replacing any previous one.
    pub fn register(&mut self, responder: Arc<Responder>) {
        self.responders.insert(responder.name().to_string(), responder);
    }

    pub fn with_responder(mut self, responder: Arc<Responder>) -> Self {
        self.register(responder);
        self
    }
}

#[async_trait]
impl AgentTransport for InProcTransport {
    async fn send(&self, peer: &str, request: TaskRequest) -> Result<TaskResult, TransportError> {
        let responder = self
            .responders
            .get(peer)
            .cloned()
            .ok_or_else(|| TransportError::UnknownPeer {
                peer: peer.to_string(),
            })?;

        tracing::debug!(peer, task_id = %request.task_id, "Delivering task");
        let mut handle = tokio::spawn(async move { responder.handle(&request).await });

        match tokio::time::timeout(self.timeout, &mut handle).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(join)) => Err(TransportError::Delivery {
                peer: peer.to_string(),
                message: join.to_string(),
            }),
            Err(_) => {
                // The caller has given up; the responder must not sign late.
                handle.abort();
                Err(TransportError::Timeout {
                    peer: peer.to_string(),
                    after: self.timeout,
                })
            }
        }
    }

    fn peers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.responders.keys().cloned().collect();
        names.sort();
        names
    }
}
