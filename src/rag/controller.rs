//! Chat controller: connects conversations to the answering pipeline.

use async_trait::async_trait;

use super::pipeline::RagPipeline;
use crate::chat::{ChatMessage, Conversation, MessageSender};

/// Placeholder text stored for image-only user messages.
const IMAGE_ONLY_TEXT: &str = "[image]";

/// [`MessageSender`] bound to one conversation and one user.
///
/// Both messages are appended only after the pipeline answers, so a failed
/// send leaves the conversation untouched.
#[derive(Debug)]
pub struct ConversationSender<'a> {
    conversation: Conversation,
    user_id: String,
    pipeline: &'a RagPipeline,
}

impl<'a> ConversationSender<'a> {
    /// Bind a sender.
    #[must_use]
    pub fn new(
        conversation: Conversation,
        user_id: impl Into<String>,
        pipeline: &'a RagPipeline,
    ) -> Self {
        Self {
            conversation,
            user_id: user_id.into(),
            pipeline,
        }
    }
}

#[async_trait]
impl MessageSender for ConversationSender<'_> {
    async fn send(&self, text: String, image_data_url: Option<String>) -> anyhow::Result<()> {
        let answer = self
            .pipeline
            .query(&self.user_id, &text, image_data_url.as_deref())
            .await?;

        let shown = if text.trim().is_empty() {
            IMAGE_ONLY_TEXT.to_string()
        } else {
            text
        };
        self.conversation.push(ChatMessage::user(shown));
        self.conversation
            .push(ChatMessage::assistant(answer.answer, answer.sources));

        tracing::info!(
            name: "chat.sent",
            conversation_id = %self.conversation.id(),
            message_count = self.conversation.len(),
            "Chat message answered"
        );
        Ok(())
    }
}
