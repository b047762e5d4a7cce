//! The `AssistantBackend` trait, the seam between a chat session and the
//! AI service that answers it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ChatError, message::ChatMessage};

/// What the assistant answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantReply {
    /// Text shown in the transcript.
    pub content: String,
    /// Optional generation payload
    /// (`{ action, nodes: [...], connections: [...] }`).
    #[serde(default)]
    pub workflow: Option<Value>,
}

impl AssistantReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            workflow: None,
        }
    }
}

/// An AI service able to answer a conversation.
///
/// Implementations must be cancel-safe: the session drops the returned
/// future when the user stops the request.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Answer the conversation so far; the last entry is the user's latest
    /// message.
    async fn complete(&self, history: &[ChatMessage]) -> Result<AssistantReply, ChatError>;
}
