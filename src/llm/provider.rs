//! Provider-specific configuration and detection.
//!
//! This module handles differences between LLM API providers, mostly URL
//! patterns.

/// Supported LLM providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    /// `OpenAI` (api.openai.com)
    OpenAI,
    /// Azure `OpenAI` Service
    AzureOpenAI {
        /// Deployment name (required for Azure)
        deployment_name: String,
        /// API version (e.g., "2024-08-01-preview")
        api_version: String,
    },
    /// `OpenRouter` (openrouter.ai)
    OpenRouter,
    /// Groq (groq.com)
    Groq,
    /// Generic OpenAI-compatible provider
    Generic,
}

/// API version used for Azure when none is configured.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-08-01-preview";

impl Provider {
    /// Detect provider from base URL.
    #[must_use]
    pub fn detect_from_url(base_url: &str) -> Self {
        let lower = base_url.to_lowercase();

        if lower.contains("azure.com") {
            Self::AzureOpenAI {
                deployment_name: String::new(),
                api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            }
        } else if lower.contains("openrouter.ai") {
            Self::OpenRouter
        } else if lower.contains("groq.com") {
            Self::Groq
        } else if lower.contains("openai.com") {
            Self::OpenAI
        } else {
            Self::Generic
        }
    }

    /// Build the chat completions URL for this provider.
    #[must_use]
    pub fn build_chat_url(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');

        match self {
            Self::AzureOpenAI {
                deployment_name,
                api_version,
            } => {
                format!(
                    "{base}/openai/deployments/{deployment_name}/chat/completions\
                     ?api-version={api_version}"
                )
            }
            Self::OpenRouter => format!("{base}/api/v1/chat/completions"),
            Self::OpenAI | Self::Groq | Self::Generic => format!("{base}/v1/chat/completions"),
        }
    }
}
