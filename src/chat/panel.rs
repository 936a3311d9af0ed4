//! Displayed chat panel state.

use super::message::ChatMessage;

/// Instruction to scroll the message list to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollRequest {
    /// Id of the newest message.
    pub message_id: String,
}

/// What the chat panel currently shows.
#[derive(Debug, Default, Clone)]
pub struct ChatPanelState {
    messages: Vec<ChatMessage>,
    loading: bool,
}

impl ChatPanelState {
    /// Create a panel state from an initial list.
    #[must_use]
    pub fn new(messages: Vec<ChatMessage>, loading: bool) -> Self {
        Self { messages, loading }
    }

    /// Displayed messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Whether an answer is pending.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Install a new message list.
    ///
    /// Returns a scroll request for the newest message whenever the list
    /// changed and is non-empty.
    pub fn replace_messages(&mut self, messages: Vec<ChatMessage>) -> Option<ScrollRequest> {
        if messages == self.messages {
            return None;
        }
        self.messages = messages;
        self.scroll_target()
    }

    /// The message the list should be scrolled to.
    #[must_use]
    pub fn scroll_target(&self) -> Option<ScrollRequest> {
        self.messages.last().map(|m| ScrollRequest {
            message_id: m.id.clone(),
        })
    }
}
