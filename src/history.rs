//! Per-conversation message history.
//!
//! One process-wide map from chat id to an ordered list of role-tagged
//! messages. Entries are created empty on first reference and live for the
//! lifetime of the process; there is no eviction and no persistence.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Conversation identifier, a Telegram chat id.
pub type ChatId = i64;

/// Message role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message
    User,
    /// Assistant (AI) response
    Assistant,
}

impl Role {
    /// String representation used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message in a conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Shared store of conversation histories.
///
/// Cloning is cheap and all clones observe the same map. Mutation is
/// serialized by a mutex over the map, so the store is safe under whatever
/// concurrency the transport delivers.
#[derive(Clone, Default)]
pub struct HistoryStore {
    inner: Arc<Mutex<HashMap<ChatId, Vec<Message>>>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the history for `chat_id` to empty, creating the entry if absent.
    pub async fn reset(&self, chat_id: ChatId) {
        let mut map = self.inner.lock().await;
        map.insert(chat_id, Vec::new());
    }

    /// Append `message` to the history for `chat_id`, creating the entry
    /// first if absent.
    pub async fn append(&self, chat_id: ChatId, message: Message) {
        let mut map = self.inner.lock().await;
        map.entry(chat_id).or_default().push(message);
    }

    /// Snapshot of the current history for `chat_id`, empty if unseen.
    pub async fn get(&self, chat_id: ChatId) -> Vec<Message> {
        let map = self.inner.lock().await;
        map.get(&chat_id).cloned().unwrap_or_default()
    }
}
