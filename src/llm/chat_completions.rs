//! OpenAI Chat Completions API client.
//!
//! Implements [`LlmClient`] for the `/v1/chat/completions` endpoint using a
//! single non-streaming request per completion.

use uuid::Uuid;

use super::{LlmClient, LlmSettings, Message, Provider};

/// Client for the OpenAI Chat Completions API.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("base_url", &self.settings.base_url)
            .field("model", &self.settings.model)
            .field("provider", &self.settings.provider)
            .finish_non_exhaustive()
    }
}

impl ChatCompletionsClient {
    /// Create a new client with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    fn request_body(&self, messages: &[Message]) -> serde_json::Value {
        serde_json::json!({
            "model": self.settings.model,
            "stream": false,
            "max_tokens": self.settings.max_tokens,
            "messages": messages,
        })
    }
}

/// Pull the assistant text out of a chat completions response body.
fn extract_content(body: &serde_json::Value) -> anyhow::Result<String> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| anyhow::anyhow!("Completion response has no message content"))
}

#[async_trait::async_trait]
impl LlmClient for ChatCompletionsClient {
    async fn complete(&self, messages: Vec<Message>) -> anyhow::Result<String> {
        let request_id = Uuid::new_v4().to_string();
        let url = self.settings.provider.build_chat_url(&self.settings.base_url);

        tracing::debug!(
            request_id = %request_id,
            url = %url,
            message_count = messages.len(),
            "Sending completion request"
        );

        let mut rb = self.http.post(&url).json(&self.request_body(&messages));
        if let Some(k) = &self.settings.api_key {
            rb = match self.settings.provider {
                Provider::AzureOpenAI { .. } => rb.header("api-key", k),
                _ => rb.bearer_auth(k),
            };
        }

        let resp = rb.send().await?.error_for_status()?;
        let body: serde_json::Value = resp.json().await?;
        let content = extract_content(&body)?;

        tracing::debug!(
            request_id = %request_id,
            content_length = content.len(),
            "Completion received"
        );

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> LlmSettings {
        LlmSettings {
            base_url: "http://localhost:11434".into(),
            api_key: None,
            model: "llama3".into(),
            provider: Provider::Generic,
            max_tokens: 1000,
        }
    }

    #[test]
    fn test_request_body() {
        let client = ChatCompletionsClient::new(settings());
        let body = client.request_body(&[Message::system("sys"), Message::user("q")]);
        assert_eq!(body["model"], "llama3");
        assert_eq!(body["stream"], false);
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][1]["content"], "q");
    }

    #[test]
    fn test_extract_content() {
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "42"}}]
        });
        assert_eq!(extract_content(&body).unwrap(), "42");
        assert!(extract_content(&serde_json::json!({"choices": []})).is_err());
    }
}
