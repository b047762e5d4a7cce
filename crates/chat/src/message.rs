//! Chat transcript entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a chat session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub is_error: bool,
    /// Generation payload for the canvas, when the assistant drafted a workflow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), false, None)
    }

    pub fn assistant(content: impl Into<String>, workflow: Option<Value>) -> Self {
        Self::new(Role::Assistant, content.into(), false, workflow)
    }

    /// Assistant-side message describing a failed request.
    pub fn error(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into(), true, None)
    }

    fn new(role: Role, content: String, is_error: bool, workflow: Option<Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            is_error,
            workflow,
            created_at: Utc::now(),
        }
    }
}
