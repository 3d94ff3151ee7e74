use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::provider::{CompletionProvider, CompletionRequest};
use crate::error::{ReflectionError, Result};

/// Groq's OpenAI-compatible API root.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`CompletionProvider`] for any `/chat/completions` endpoint speaking the
/// OpenAI wire format (Groq, OpenAI, local gateways).
///
/// A provider built without an API key is still usable: every call fails
/// with [`ReflectionError::MissingApiKey`], which callers turn into their
/// fallback response.
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl fmt::Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl OpenAiCompatibleProvider {
    /// Provider for `base_url`. A blank key is treated as missing.
    ///
    /// Fails only if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let api_key = api_key.filter(|key| !key.trim().is_empty());

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }

    /// Provider pointed at Groq with the default request timeout.
    pub fn groq(api_key: Option<String>) -> Result<Self> {
        Self::new(DEFAULT_BASE_URL, api_key, DEFAULT_TIMEOUT)
    }

    /// Whether requests will be attempted at all.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Full chat-completions URL.
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: Option<ChatCompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: Option<String>,
}

#[async_trait]
impl CompletionProvider for OpenAiCompatibleProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<Option<String>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ReflectionError::MissingApiKey)?;

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "requesting chat completion"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReflectionError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let payload: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| ReflectionError::Decode(err.to_string()))?;

        Ok(payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content))
    }
}
