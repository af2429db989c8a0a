mod client;
pub(crate) mod types;

use tracing::debug;

use crate::error::{AiError, Result};
use crate::traits::Message;

use client::ChatCompletionsApi;
use types::{ChatRequest, WireMessage};

/// OpenAI-compatible router in front of the Hugging Face inference providers.
pub const HF_ROUTER_URL: &str = "https://router.huggingface.co/v1";

/// Sampling options for one completion call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChatOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl ChatOptions {
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

// =============================================================================
// Inference Client
// =============================================================================

/// Chat-completions client. The model is chosen per call so one client can
/// serve an ordered list of models.
#[derive(Clone)]
pub struct InferenceClient {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl InferenceClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: HF_ROUTER_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("HF_TOKEN")
            .map_err(|_| AiError::Config("HF_TOKEN environment variable not set".into()))?;
        Ok(Self::new(api_key))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api(&self) -> ChatCompletionsApi<'_> {
        ChatCompletionsApi::new(&self.api_key, &self.http, &self.base_url)
    }

    /// Run a chat completion and return the first choice's text.
    pub async fn chat_completion(
        &self,
        model: &str,
        messages: &[Message],
        options: ChatOptions,
    ) -> Result<String> {
        let request = ChatRequest::new(model)
            .messages(messages.iter().map(WireMessage::from))
            .max_tokens(options.max_tokens)
            .temperature(options.temperature);

        let response = self.api().chat(&request).await?;

        if let Some(ref usage) = response.usage {
            debug!(
                model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Chat completion usage"
            );
        }

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| AiError::EmptyResponse(model.to_string()))
    }

    /// System + user prompt convenience wrapper.
    pub async fn complete(
        &self,
        model: &str,
        system: impl Into<String>,
        user: impl Into<String>,
        options: ChatOptions,
    ) -> Result<String> {
        let messages = [Message::system(system), Message::user(user)];
        self.chat_completion(model, &messages, options).await
    }
}
