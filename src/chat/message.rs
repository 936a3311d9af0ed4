//! Chat message model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Author of a displayed chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Message typed by the user.
    User,
    /// Answer produced by the assistant.
    Assistant,
}

impl ChatRole {
    /// Lowercase name used in markup and JSON.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A message shown in the chat panel.
///
/// Messages are immutable once appended to a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message identifier.
    pub id: String,
    /// Author of the message.
    pub role: ChatRole,
    /// Text content.
    pub content: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Ordered source citations (assistant answers only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

impl ChatMessage {
    /// Create a user message stamped with the current time.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: ChatRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            sources: None,
        }
    }

    /// Create an assistant message with its citations.
    ///
    /// An empty citation list is stored as `None` so no empty
    /// "Sources:" line is rendered.
    #[must_use]
    pub fn assistant(content: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: ChatRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            sources: (!sources.is_empty()).then_some(sources),
        }
    }

    /// Local wall-clock time shown under the message bubble.
    #[must_use]
    pub fn display_time(&self) -> String {
        self.timestamp
            .with_timezone(&chrono::Local)
            .format("%H:%M:%S")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assistant_without_sources_has_none() {
        let msg = ChatMessage::assistant("No context found.", Vec::new());
        assert!(msg.sources.is_none());
        assert_eq!(msg.role, ChatRole::Assistant);
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = ChatMessage::user("one");
        let b = ChatMessage::user("one");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let msg = ChatMessage::assistant("hi", vec!["doc-1".to_string()]);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["sources"][0], "doc-1");
    }
}
