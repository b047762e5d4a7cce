//! Key-value storage for chat transcripts.
//!
//! Sessions write their whole transcript as one JSON string under
//! [`history_key`].  Hosts inject the store; tests use [`MemoryHistoryStore`].

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::ChatError;

/// `chat_history:<tenant>:<session>`
pub fn history_key(tenant: impl std::fmt::Display, session: &str) -> String {
    format!("chat_history:{tenant}:{session}")
}

/// A string key-value store.
pub trait HistoryStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ChatError>;
    fn set(&self, key: &str, value: String) -> Result<(), ChatError>;
    fn remove(&self, key: &str) -> Result<(), ChatError>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ChatError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), ChatError> {
        self.entries().insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ChatError> {
        self.entries().remove(key);
        Ok(())
    }
}
