//! Chat session state machine.
//!
//! ```text
//! idle ──send──▶ sending ──reply──▶ idle
//!   ▲               │  └──failure──▶ error ──send/retry──▶ sending
//!   └─────stop──────┘
//! ```
//!
//! One request is in flight at a time.  Every request gets a generation
//! number and a `CancellationToken`; `stop`, a superseding send and every new
//! request advance the generation.  A reply that comes back for a generation
//! that is no longer current is dropped without touching the transcript.
//!
//! The inner mutex is never held across an `.await`.

use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::backend::{AssistantBackend, AssistantReply};
use crate::history::HistoryStore;
use crate::message::{ChatMessage, Role};
use crate::ChatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatState {
    Idle,
    Sending,
    Error,
}

/// What to do with a send that arrives while another is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendPolicy {
    /// Refuse with [`ChatError::Busy`].
    #[default]
    Reject,
    /// Cancel the in-flight request and send the new one.
    CancelPrevious,
}

impl FromStr for SendPolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reject"          => Ok(Self::Reject),
            "cancel_previous" => Ok(Self::CancelPrevious),
            other             => Err(format!("unknown send policy: {other}")),
        }
    }
}

/// How a send or retry ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The assistant answered and its message was appended.
    Replied(ChatMessage),
    /// The request was stopped or superseded; nothing was appended.
    Cancelled,
}

struct Inner {
    state: ChatState,
    messages: Vec<ChatMessage>,
    generation: u64,
    in_flight: Option<CancellationToken>,
}

/// One conversation with the assistant.
///
/// Share it behind an `Arc` so one task can `stop` while another awaits
/// `send`.
pub struct ChatSession {
    key: String,
    backend: Arc<dyn AssistantBackend>,
    store: Arc<dyn HistoryStore>,
    policy: SendPolicy,
    inner: Mutex<Inner>,
}

impl ChatSession {
    /// Open the session stored under `key`.  A missing or unreadable
    /// transcript starts empty.
    pub fn open(
        key: impl Into<String>,
        backend: Arc<dyn AssistantBackend>,
        store: Arc<dyn HistoryStore>,
        policy: SendPolicy,
    ) -> Self {
        let key = key.into();
        let messages = load_history(store.as_ref(), &key);

        Self {
            key,
            backend,
            store,
            policy,
            inner: Mutex::new(Inner {
                state: ChatState::Idle,
                messages,
                generation: 0,
                in_flight: None,
            }),
        }
    }

    pub fn state(&self) -> ChatState {
        self.lock().state
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock().messages.clone()
    }

    /// Append a user message and ask the assistant to answer it.
    ///
    /// # Errors
    /// [`ChatError::Busy`] under [`SendPolicy::Reject`] while a request is in
    /// flight, [`ChatError::EmptyMessage`] for blank text, and the backend's
    /// error when the request fails (an error message is appended first).
    #[instrument(skip(self, text), fields(session = %self.key))]
    pub async fn send(&self, text: impl Into<String>) -> Result<SendOutcome, ChatError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let (generation, token, history) = self.begin(Some(text))?;
        self.dispatch(generation, token, history).await
    }

    /// Ask again for the last user message without appending it twice.
    #[instrument(skip(self), fields(session = %self.key))]
    pub async fn retry(&self) -> Result<SendOutcome, ChatError> {
        let (generation, token, history) = self.begin(None)?;
        self.dispatch(generation, token, history).await
    }

    /// Cancel the in-flight request, if any, and return to idle.
    ///
    /// The user message that started the request stays in the transcript.
    pub fn stop(&self) -> bool {
        let mut inner = self.lock();
        match inner.in_flight.take() {
            Some(token) => {
                token.cancel();
                inner.generation += 1;
                inner.state = ChatState::Idle;
                info!(session = %self.key, "chat request stopped");
                true
            }
            None => false,
        }
    }

    /// Drop the transcript (and any in-flight request).
    pub fn clear(&self) -> Result<(), ChatError> {
        let mut inner = self.lock();
        if let Some(token) = inner.in_flight.take() {
            token.cancel();
        }
        inner.generation += 1;
        inner.state = ChatState::Idle;
        inner.messages.clear();
        self.store.remove(&self.key)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    /// Move to `sending` and hand back what the request needs.
    ///
    /// `Some(text)` appends a new user message; `None` re-sends the last one.
    fn begin(&self, text: Option<String>) -> Result<(u64, CancellationToken, Vec<ChatMessage>), ChatError> {
        let mut inner = self.lock();

        if inner.state == ChatState::Sending {
            match self.policy {
                SendPolicy::Reject => return Err(ChatError::Busy),
                SendPolicy::CancelPrevious => {
                    if let Some(previous) = inner.in_flight.take() {
                        previous.cancel();
                        debug!(session = %self.key, "superseding in-flight chat request");
                    }
                }
            }
        }

        match text {
            Some(text) => {
                inner.messages.push(ChatMessage::user(text));
                self.persist(&inner.messages);
            }
            None => {
                if !inner.messages.iter().any(|m| m.role == Role::User) {
                    return Err(ChatError::NothingToRetry);
                }
            }
        }

        inner.generation += 1;
        let token = CancellationToken::new();
        inner.in_flight = Some(token.clone());
        inner.state = ChatState::Sending;

        // A retry answers the last user message, so anything after it
        // (an error reply) is left out.
        let history = match inner.messages.iter().rposition(|m| m.role == Role::User) {
            Some(last_user) => inner.messages[..=last_user].to_vec(),
            None => inner.messages.clone(),
        };

        Ok((inner.generation, token, history))
    }

    async fn dispatch(
        &self,
        generation: u64,
        token: CancellationToken,
        history: Vec<ChatMessage>,
    ) -> Result<SendOutcome, ChatError> {
        let guard = InFlightGuard {
            session: self,
            generation,
            armed: true,
        };
        let result: Option<Result<AssistantReply, ChatError>> = tokio::select! {
            _ = token.cancelled() => None,
            reply = self.backend.complete(&history) => Some(reply),
        };
        guard.disarm();

        let mut inner = self.lock();
        if inner.generation != generation || token.is_cancelled() {
            debug!(session = %self.key, generation, "discarding answer for a cancelled request");
            return Ok(SendOutcome::Cancelled);
        }
        inner.in_flight = None;

        match result {
            None => {
                inner.state = ChatState::Idle;
                Ok(SendOutcome::Cancelled)
            }
            Some(Ok(reply)) => {
                let message = ChatMessage::assistant(reply.content, reply.workflow);
                inner.messages.push(message.clone());
                inner.state = ChatState::Idle;
                self.persist(&inner.messages);
                info!(session = %self.key, "assistant replied");
                Ok(SendOutcome::Replied(message))
            }
            Some(Err(err)) => {
                warn!(session = %self.key, "chat request failed: {}", err);
                inner.messages.push(ChatMessage::error(err.to_string()));
                inner.state = ChatState::Error;
                self.persist(&inner.messages);
                Err(err)
            }
        }
    }

    fn persist(&self, messages: &[ChatMessage]) {
        let result = serde_json::to_string(messages)
            .map_err(ChatError::from)
            .and_then(|encoded| self.store.set(&self.key, encoded));
        if let Err(e) = result {
            warn!(session = %self.key, "could not save chat history: {}", e);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the session to idle when a `send`/`retry` future is dropped
/// before its answer arrives (e.g. the HTTP client went away).
struct InFlightGuard<'a> {
    session: &'a ChatSession,
    generation: u64,
    armed: bool,
}

impl InFlightGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.session.lock();
        if inner.generation != self.generation {
            return;
        }
        if let Some(token) = inner.in_flight.take() {
            token.cancel();
        }
        inner.generation += 1;
        inner.state = ChatState::Idle;
        debug!(session = %self.session.key, "chat request abandoned by its caller");
    }
}

fn load_history(store: &dyn HistoryStore, key: &str) -> Vec<ChatMessage> {
    match store.get(key) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(session = %key, "ignoring unreadable chat history: {}", e);
            Vec::new()
        }),
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!(session = %key, "could not load chat history: {}", e);
            Vec::new()
        }
    }
}
