//! OpenAI-compatible provider implementation
//!
//! Works with OpenAI, vLLM, Ollama, LiteLLM and other OpenAI-compatible APIs.
//! Local proxies usually only expose the legacy text endpoint, so both
//! `/completions` and `/chat/completions` are supported.

use super::*;
use crate::http;
use essaycraft_error::ErrorKind;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// OpenAI-compatible provider
pub struct OpenAICompatProvider {
    client: Client,
    config: ProviderConfig,
}

impl OpenAICompatProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        config.validate()?;
        let client = http::build_client(config.timeout_secs, "openai-compat")?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        match self.config.api_style {
            ApiStyle::Completions => format!("{}/completions", base),
            ApiStyle::Chat => format!("{}/chat/completions", base),
        }
    }

    fn build_body(&self, request: &CompletionRequest) -> serde_json::Result<serde_json::Value> {
        let model = self.config.default_model.clone();

        match self.config.api_style {
            ApiStyle::Completions => serde_json::to_value(TextRequest {
                model,
                prompt: request.flatten(),
                max_tokens: request.max_tokens,
            }),
            ApiStyle::Chat => serde_json::to_value(ChatRequest {
                model,
                messages: request
                    .messages
                    .iter()
                    .map(|m| ApiMessage {
                        role: m.role.as_str().to_string(),
                        content: Some(m.content.clone()),
                    })
                    .collect(),
                max_tokens: request.max_tokens,
            }),
        }
    }
}

impl CompletionProvider for OpenAICompatProvider {
    fn name(&self) -> &str {
        "openai-compat"
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = self.build_body(&request).map_err(|e| {
            Error::new(ErrorKind::Unexpected, "failed to encode completion request")
                .with_operation("openai::complete")
                .set_source(e)
        })?;

        let endpoint = self.endpoint();
        tracing::debug!(
            endpoint = %endpoint,
            messages = request.messages.len(),
            "sending completion request"
        );

        let mut req = self.client.post(&endpoint).json(&body);

        if let Some(api_key) = &self.config.api_key {
            if !api_key.is_empty() {
                req = req.header("Authorization", format!("Bearer {}", api_key));
            }
        }

        let response = req
            .send()
            .await
            .map_err(|e| http::transport_error(e, "openai::complete"))?;
        let response = http::check_status(
            response,
            "openai-compat",
            "openai::complete",
            ErrorKind::InferenceFailed,
        )
        .await?;

        let api_response: ApiResponse = http::decode_json(response, "openai::complete").await?;
        let completion = api_response
            .into_completion()
            .map_err(|e| e.with_context("endpoint", endpoint))?;

        tracing::debug!(
            id = %completion.id,
            model = %completion.model,
            prompt_tokens = completion.usage.prompt_tokens,
            completion_tokens = completion.usage.completion_tokens,
            "completion received"
        );

        Ok(completion)
    }
}

// ============================================================================
// OpenAI API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct TextRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

/// Both endpoints share this envelope; text completions fill `text`,
/// chat completions fill `message`.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    message: Option<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
    #[serde(default)]
    total_tokens: usize,
}

impl ApiResponse {
    /// Whitespace-only text comes back as `content: None`; deciding whether
    /// that is a failure is up to the caller.
    fn into_completion(self) -> Result<CompletionResponse> {
        let usage = self
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        let choice = self.choices.into_iter().next().ok_or_else(|| {
            Error::inference_failed("no choices in response").with_operation("openai::complete")
        })?;

        let content = choice
            .text
            .or_else(|| choice.message.and_then(|m| m.content))
            .filter(|c| !c.trim().is_empty());

        Ok(CompletionResponse {
            id: self.id,
            model: self.model,
            content,
            usage,
        })
    }
}
