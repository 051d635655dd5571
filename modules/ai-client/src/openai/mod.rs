mod client;
pub(crate) mod schema;
pub(crate) mod types;

pub use schema::StructuredOutput;

use anyhow::{anyhow, Result};
use tracing::{debug, warn};

use crate::util::{close_truncated_array, strip_code_blocks, truncate_to_char_boundary};
use client::{OpenAiClient, OPENAI_API_URL};

/// Bytes of the raw response quoted in parse errors.
const ERROR_SNIPPET_BYTES: usize = 200;

// =============================================================================
// OpenAi
// =============================================================================

#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    model: String,
    temperature: f32,
    max_completion_tokens: Option<u32>,
    base_url: Option<String>,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.2,
            max_completion_tokens: None,
            base_url: None,
        }
    }

    pub fn with_max_completion_tokens(mut self, tokens: u32) -> Self {
        self.max_completion_tokens = Some(tokens);
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> OpenAiClient {
        OpenAiClient::new(
            &self.api_key,
            self.base_url.as_deref().unwrap_or(OPENAI_API_URL),
        )
    }

    /// Type-safe structured output extraction.
    ///
    /// `schema_name` is the name OpenAI reports back for the schema. A payload
    /// cut off by the token limit is repaired by closing its top-level array
    /// after the last complete element.
    pub async fn extract<T: StructuredOutput>(
        &self,
        schema_name: &str,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Result<T> {
        let request = types::StructuredRequest {
            model: self.model.clone(),
            messages: vec![
                types::WireMessage::system(system_prompt),
                types::WireMessage::user(user_prompt),
            ],
            temperature: types::accepts_temperature(&self.model).then_some(self.temperature),
            max_completion_tokens: self.max_completion_tokens,
            response_format: types::ResponseFormat::json_schema(schema_name, T::openai_schema()),
        };

        debug!(type_name = %T::type_name(), "OpenAI structured output extraction");

        let completion = self.client().structured_output(&request).await?;
        parse_structured(&completion.content, completion.truncated)
    }
}

/// Parse a structured response, falling back to truncation repair.
pub(crate) fn parse_structured<T: StructuredOutput>(raw: &str, truncated: bool) -> Result<T> {
    let body = strip_code_blocks(raw);

    match serde_json::from_str::<T>(body) {
        Ok(value) => Ok(value),
        Err(first_err) => {
            let repaired = close_truncated_array(body).filter(|_| truncated || !body.ends_with('}'));
            if let Some(repaired) = repaired {
                warn!(
                    response_bytes = body.len(),
                    "Structured response was cut off, keeping complete elements"
                );
                if let Ok(value) = serde_json::from_str::<T>(&repaired) {
                    return Ok(value);
                }
            }

            Err(anyhow!(
                "Failed to deserialize response ({} bytes): {}. Starts with: {}",
                body.len(),
                first_err,
                truncate_to_char_boundary(body, ERROR_SNIPPET_BYTES)
            ))
        }
    }
}
