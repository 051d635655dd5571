use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, warn};

use super::types::{ChatResponse, StructuredRequest};
use crate::util::truncate_to_char_boundary;

pub(crate) const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Bytes of an error body kept in the returned error.
const ERROR_BODY_BYTES: usize = 500;

/// Raw completion text plus whether the model stopped on its token limit.
pub(crate) struct Completion {
    pub content: String,
    pub truncated: bool,
}

/// One chat-completions endpoint with one key.
pub(crate) struct OpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(api_key: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        }
    }

    pub async fn structured_output(&self, request: &StructuredRequest) -> Result<Completion> {
        debug!(model = %request.model, messages = request.messages.len(), "Chat completion request");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .with_context(|| format!("POST {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                "chat completion failed ({status}): {}",
                truncate_to_char_boundary(&body, ERROR_BODY_BYTES)
            );
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("chat completion response was not valid JSON")?;

        if let Some(usage) = &parsed.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Token usage"
            );
        }

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("chat completion returned no choices"))?;

        let truncated = choice.finish_reason.as_deref() == Some("length");
        if truncated {
            warn!(model = %request.model, "Completion stopped at the token limit");
        }

        let content = choice
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| anyhow!("chat completion had no content"))?;

        Ok(Completion { content, truncated })
    }
}
