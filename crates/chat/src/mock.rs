//! `MockAssistant`, a test double for `AssistantBackend`.
//!
//! Useful in unit and integration tests where the real chat function is
//! unavailable or irrelevant.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;

use crate::backend::{AssistantBackend, AssistantReply};
use crate::{ChatError, message::ChatMessage};

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum MockBehaviour {
    /// Answer with this reply.
    Reply(AssistantReply),
    /// Fail with a backend error.
    Fail(String),
}

/// A mock assistant that records every call and answers from a script.
///
/// The script is consumed front to back; its last entry repeats forever.
pub struct MockAssistant {
    script: Mutex<VecDeque<MockBehaviour>>,
    /// When set, every call waits for one `notify_one` before answering.
    gate: Option<Arc<Notify>>,
    /// History length seen by each call (in call order).
    pub calls: Arc<Mutex<Vec<usize>>>,
}

impl MockAssistant {
    /// Answer from the given script.
    pub fn scripted(script: Vec<MockBehaviour>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            gate: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always answer with plain text.
    pub fn replying(content: impl Into<String>) -> Self {
        Self::scripted(vec![MockBehaviour::Reply(AssistantReply::text(content))])
    }

    /// Always answer with text plus a generation payload.
    pub fn replying_with_workflow(content: impl Into<String>, workflow: Value) -> Self {
        Self::scripted(vec![MockBehaviour::Reply(AssistantReply {
            content: content.into(),
            workflow: Some(workflow),
        })])
    }

    /// Always fail.
    pub fn failing(msg: impl Into<String>) -> Self {
        Self::scripted(vec![MockBehaviour::Fail(msg.into())])
    }

    /// Hold every answer until the test releases it through `gate`.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    fn next_behaviour(&self) -> MockBehaviour {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        if script.len() > 1 {
            script.pop_front().unwrap_or_else(|| MockBehaviour::Fail("empty script".into()))
        } else {
            script
                .front()
                .cloned()
                .unwrap_or_else(|| MockBehaviour::Fail("empty script".into()))
        }
    }
}

#[async_trait]
impl AssistantBackend for MockAssistant {
    async fn complete(&self, history: &[ChatMessage]) -> Result<AssistantReply, ChatError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(history.len());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match self.next_behaviour() {
            MockBehaviour::Reply(reply) => Ok(reply),
            MockBehaviour::Fail(msg) => Err(ChatError::Backend(msg)),
        }
    }
}
