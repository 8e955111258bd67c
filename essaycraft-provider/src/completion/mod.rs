//! # Completion Provider Interface
//!
//! A trait-based abstraction over a text-completion backend.
//!
//! ## Design
//! - `CompletionProvider` trait defines the core interface
//! - `OpenAICompatProvider` speaks to any OpenAI-compatible server, either the
//!   legacy `/completions` endpoint or `/chat/completions`
//! - One call per request; backend errors propagate, nothing is retried
//! - Usage tracking

pub mod openai;

pub use openai::OpenAICompatProvider;

use essaycraft_error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Core Types
// ============================================================================

/// A role-tagged message sent to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Request parameters for a completion
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: Option<usize>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Flatten the conversation into a single prompt, one `role: content`
    /// line per message. Used by backends that only accept raw text.
    pub fn flatten(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role.as_str(), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub id: String,
    pub model: String,
    /// `None` when the model produced only whitespace
    pub content: Option<String>,
    pub usage: Usage,
}

/// Token usage information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

// ============================================================================
// Provider Trait
// ============================================================================

/// The completion capability: given a prompt, return generated text.
#[allow(async_fn_in_trait)]
pub trait CompletionProvider: Send + Sync {
    /// Get the provider name (e.g., "openai-compat")
    fn name(&self) -> &str;

    /// Get the model used when a request doesn't name one
    fn default_model(&self) -> &str;

    /// Send one completion request
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Which OpenAI-compatible endpoint to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiStyle {
    /// `POST {base}/completions` with a flattened `prompt`
    #[default]
    Completions,
    /// `POST {base}/chat/completions` with role-tagged `messages`
    Chat,
}

/// Configuration for the completion backend
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_style: ApiStyle,
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::local_proxy()
    }
}

impl ProviderConfig {
    /// A local OpenAI-compatible proxy (e.g. LiteLLM in front of Mistral).
    /// Default port: 4000
    pub fn local_proxy() -> Self {
        Self {
            api_style: ApiStyle::Completions,
            api_key: None,
            base_url: "http://localhost:4000/v1".into(),
            default_model: "mistral".into(),
            timeout_secs: 120,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_style(mut self, api_style: ApiStyle) -> Self {
        self.api_style = api_style;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::config_invalid("base_url", "completion base URL is empty"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::config_invalid(
                "base_url",
                format!("'{}' is not an http(s) URL", self.base_url),
            ));
        }
        if self.default_model.trim().is_empty() {
            return Err(Error::config_invalid("model", "model name is empty"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config_invalid("timeout_secs", "timeout must be positive"));
        }
        Ok(())
    }
}

// ============================================================================
// Usage Tracking
// ============================================================================

/// Tracks token usage across multiple calls
#[derive(Debug, Clone, Default)]
pub struct UsageTracker {
    pub total_calls: usize,
    pub total_prompt_tokens: usize,
    pub total_completion_tokens: usize,
    pub by_model: HashMap<String, Usage>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, model: &str, usage: &Usage) {
        self.total_calls += 1;
        self.total_prompt_tokens += usage.prompt_tokens;
        self.total_completion_tokens += usage.completion_tokens;

        let entry = self.by_model.entry(model.to_string()).or_default();
        entry.prompt_tokens += usage.prompt_tokens;
        entry.completion_tokens += usage.completion_tokens;
        entry.total_tokens += usage.total_tokens;
    }

    pub fn total_tokens(&self) -> usize {
        self.total_prompt_tokens + self.total_completion_tokens
    }
}

// ============================================================================
// Tests
// ============================================================================
