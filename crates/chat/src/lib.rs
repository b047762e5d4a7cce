//! `chat` crate: the assistant chat session and the backends it talks to.
//!
//! A [`ChatSession`] owns one transcript, keeps at most one request in
//! flight, and persists the transcript through an injected [`HistoryStore`].
//! The AI service sits behind [`AssistantBackend`].

pub mod error;
pub mod message;
pub mod backend;
pub mod history;
pub mod session;
pub mod http;
pub mod mock;

pub use error::ChatError;
pub use message::{ChatMessage, Role};
pub use backend::{AssistantBackend, AssistantReply};
pub use history::{history_key, HistoryStore, MemoryHistoryStore};
pub use session::{ChatSession, ChatState, SendOutcome, SendPolicy};
pub use http::HttpAssistant;
