//! HTTP backend for OpenAI-compatible `chat/completions` endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::backend::GenerationBackend;
use crate::error::BackendError;
use crate::types::GenerationRequest;

/// Bodies of error responses are cut to this many characters in errors.
const ERROR_BODY_LIMIT: usize = 500;

/// A chat-completions model served over HTTP.
///
/// Use [`ChatCompletionsBackend::new`] with a base URL such as
/// `https://api.openai.com/v1`, or point it at a mock server in tests.
pub struct ChatCompletionsBackend {
    name: String,
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionsBackend {
    /// Creates a backend for `model` at `base_url`.
    ///
    /// `timeout_secs` is a transport-level ceiling; the chain applies the
    /// per-request budget on top of it.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        name: &str,
        base_url: &str,
        model: &str,
        api_key: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("recgen/0.1 (recommendation-pipeline)")
            .build()?;

        Ok(Self {
            name: name.to_owned(),
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.to_owned(),
            api_key: api_key.map(str::to_owned),
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl GenerationBackend for ChatCompletionsBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, BackendError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            max_tokens: request.max_output_tokens,
            temperature: request.temperature,
            response_format: request.require_structured.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let mut builder = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: text.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| BackendError::Deserialize {
                context: format!("{} chat completion", self.name),
                source: e,
            })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(BackendError::Empty);
        }
        Ok(content)
    }
}

impl std::fmt::Debug for ChatCompletionsBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsBackend")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_strips_trailing_slash() {
        let backend =
            ChatCompletionsBackend::new("default", "http://localhost:8080/v1/", "m", None, 30)
                .expect("client construction should not fail");
        assert_eq!(backend.endpoint, "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn debug_redacts_api_key() {
        let backend = ChatCompletionsBackend::new(
            "default",
            "http://localhost:8080/v1",
            "m",
            Some("sk-secret"),
            30,
        )
        .expect("client construction should not fail");
        let rendered = format!("{backend:?}");
        assert!(!rendered.contains("sk-secret"));
    }
}
