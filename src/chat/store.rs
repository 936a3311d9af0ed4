//! Conversation history storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::message::ChatMessage;

/// Default conversation idle timeout (30 minutes).
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// A single conversation.
///
/// Cloning is cheap; clones share the same history.
#[derive(Debug, Clone)]
pub struct Conversation {
    inner: Arc<ConversationInner>,
}

#[derive(Debug)]
struct ConversationInner {
    id: String,
    messages: RwLock<Vec<ChatMessage>>,
    last_activity: RwLock<DateTime<Utc>>,
}

impl Conversation {
    fn new(id: String) -> Self {
        Self {
            inner: Arc::new(ConversationInner {
                id,
                messages: RwLock::new(Vec::new()),
                last_activity: RwLock::new(Utc::now()),
            }),
        }
    }

    /// Conversation id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Append a message.
    pub fn push(&self, message: ChatMessage) {
        let mut guard = self.inner.messages.write().unwrap();
        guard.push(message);
        drop(guard);
        self.touch();
    }

    /// Snapshot of all messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.inner.messages.read().unwrap().clone()
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.messages.read().unwrap().len()
    }

    /// Whether the conversation has no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all messages.
    pub fn clear(&self) {
        self.inner.messages.write().unwrap().clear();
        self.touch();
    }

    fn touch(&self) {
        *self.inner.last_activity.write().unwrap() = Utc::now();
    }

    /// Whether the conversation has been idle longer than `timeout`.
    #[must_use]
    pub fn is_idle_for(&self, timeout: Duration) -> bool {
        let last = *self.inner.last_activity.read().unwrap();
        (Utc::now() - last)
            .to_std()
            .is_ok_and(|idle| idle > timeout)
    }
}

/// Thread-safe store of conversations.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    inner: Arc<RwLock<HashMap<String, Conversation>>>,
}

impl ConversationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a conversation with a fresh id.
    #[must_use]
    pub fn create(&self) -> Conversation {
        self.create_with_id(Uuid::new_v4().to_string())
    }

    /// Create (or replace) a conversation with a specific id.
    #[must_use]
    pub fn create_with_id(&self, id: impl Into<String>) -> Conversation {
        let id = id.into();
        let conversation = Conversation::new(id.clone());
        self.inner
            .write()
            .unwrap()
            .insert(id, conversation.clone());
        conversation
    }

    /// Look up a conversation.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Conversation> {
        self.inner.read().unwrap().get(id).cloned()
    }

    /// Look up a conversation, creating it if missing.
    ///
    /// Concurrent callers with the same id get the same conversation.
    #[must_use]
    pub fn get_or_create(&self, id: &str) -> Conversation {
        self.inner
            .write()
            .unwrap()
            .entry(id.to_string())
            .or_insert_with(|| Conversation::new(id.to_string()))
            .clone()
    }

    /// Remove a conversation.
    pub fn remove(&self, id: &str) -> Option<Conversation> {
        self.inner.write().unwrap().remove(id)
    }

    /// Number of conversations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove conversations idle for longer than the default timeout.
    ///
    /// Returns the number removed.
    pub fn cleanup_idle(&self) -> usize {
        self.cleanup_idle_with_timeout(DEFAULT_IDLE_TIMEOUT)
    }

    /// Remove conversations idle for longer than `timeout`.
    pub fn cleanup_idle_with_timeout(&self, timeout: Duration) -> usize {
        let mut guard = self.inner.write().unwrap();
        let before = guard.len();
        guard.retain(|_, c| !c.is_idle_for(timeout));
        before - guard.len()
    }
}
