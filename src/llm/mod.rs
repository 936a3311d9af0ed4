//! LLM client abstraction.
//!
//! The question-answering pipeline talks to the model through the
//! [`LlmClient`] trait. [`ChatCompletionsClient`] implements it against any
//! OpenAI-compatible `/v1/chat/completions` endpoint.
//!
//! # Example
//!
//! ```rust,ignore
//! use notebook_llm::llm::{ChatCompletionsClient, LlmClient, LlmSettings, Message, Provider};
//!
//! let settings = LlmSettings {
//!     base_url: "https://api.openai.com".to_string(),
//!     api_key: Some("sk-...".to_string()),
//!     model: "gpt-4o".to_string(),
//!     provider: Provider::OpenAI,
//!     max_tokens: 1000,
//! };
//! let client = ChatCompletionsClient::new(settings);
//! let answer = client.complete(vec![Message::user("Hello")]).await?;
//! ```

pub mod chat_completions;
pub mod provider;

pub use chat_completions::ChatCompletionsClient;
pub use provider::{DEFAULT_AZURE_API_VERSION, Provider};

/// LLM connection and model settings.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Base URL for the LLM API (e.g., `https://api.openai.com`).
    pub base_url: String,
    /// Optional API key for authentication.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Provider type (auto-detected from `base_url`).
    pub provider: Provider,
    /// Maximum tokens in a completion.
    pub max_tokens: u32,
}

/// A message sent to the model.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    /// Role of the message author.
    pub role: MessageRole,
    /// Text or multimodal content.
    pub content: MessageContent,
}

impl Message {
    /// System prompt message.
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Plain user message.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Text(text.into()),
        }
    }

    /// User message with an image (data URL or HTTP URL) before the text.
    #[must_use]
    pub fn user_with_image(text: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Parts(vec![
                ContentPart::image_url(image_url),
                ContentPart::text(text),
            ]),
        }
    }
}

/// Message content - either simple text or multimodal parts.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content.
    Text(String),
    /// Multimodal content with text and image parts.
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// The text content (first text part for multimodal content).
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(content) => Some(content),
            Self::Parts(parts) => parts.iter().find_map(|p| match p {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::ImageUrl { .. } => None,
            }),
        }
    }

    /// Whether the content contains any images.
    #[must_use]
    pub fn has_images(&self) -> bool {
        match self {
            Self::Parts(parts) => parts
                .iter()
                .any(|p| matches!(p, ContentPart::ImageUrl { .. })),
            Self::Text(_) => false,
        }
    }
}

/// A content part for multimodal messages.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
    /// Image content (URL or base64 data URL).
    ImageUrl {
        /// Image URL configuration.
        image_url: ImageUrl,
    },
}

impl ContentPart {
    /// Create a text content part.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text { text: s.into() }
    }

    /// Create an image URL content part.
    #[must_use]
    pub fn image_url(url: impl Into<String>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl {
                url: url.into(),
                detail: None,
            },
        }
    }
}

/// Image URL configuration for multimodal content.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageUrl {
    /// Image URL (can be HTTP URL or base64 data URL).
    pub url: String,
    /// Detail level for image processing: "auto", "low", or "high".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System prompt.
    System,
    /// User message.
    User,
    /// Assistant response.
    Assistant,
}

/// Trait for non-streaming LLM completion.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete a conversation and return the assistant text.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response has no text.
    async fn complete(&self, messages: Vec<Message>) -> anyhow::Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_message_serializes_flat() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn test_image_message_puts_image_first() {
        let msg = Message::user_with_image("what is this?", "data:image/png;base64,AAAA");
        assert!(msg.content.has_images());
        assert_eq!(msg.content.as_text(), Some("what is this?"));

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["content"][0]["type"], "image_url");
        assert_eq!(json["content"][0]["image_url"]["url"], "data:image/png;base64,AAAA");
        assert_eq!(json["content"][1]["type"], "text");
    }
}
