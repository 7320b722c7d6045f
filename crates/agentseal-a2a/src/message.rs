//! Task messages exchanged between agents

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// One piece of message content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Part {
    Text { text: String },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
        }
    }
}

/// A task sent to a peer agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub message_id: String,
    pub task_id: String,
    pub context_id: String,
    pub role: Role,
    pub parts: Vec<Part>,
}

impl TaskRequest {
    /// A fresh single-part user task.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            task_id: Uuid::new_v4().to_string(),
            context_id: Uuid::new_v4().to_string(),
            role: Role::User,
            parts: vec![Part::text(text)],
        }
    }

    /// Text content, parts joined by newlines.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Completed,
    Failed,
}

/// A peer's answer to a [`TaskRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: String,
    pub context_id: String,
    pub state: TaskState,
    pub artifacts: Vec<Artifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskResult {
    pub fn completed(request: &TaskRequest, artifacts: Vec<Artifact>) -> Self {
        Self {
            task_id: request.task_id.clone(),
            context_id: request.context_id.clone(),
            state: TaskState::Completed,
            artifacts,
            error: None,
        }
    }

    pub fn failed(request: &TaskRequest, error: impl Into<String>) -> Self {
        Self {
            task_id: request.task_id.clone(),
            context_id: request.context_id.clone(),
            state: TaskState::Failed,
            artifacts: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state == TaskState::Completed
    }

    /// Every text part of every artifact, in order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.artifacts
            .iter()
            .flat_map(|a| a.parts.iter())
            .filter_map(Part::as_text)
    }
}
