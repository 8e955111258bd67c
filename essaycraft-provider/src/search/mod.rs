//! # Search Provider Interface
//!
//! "Given a query string, return an ordered sequence of text snippets."
//!
//! - `TavilyProvider`: primary, Tavily search API
//! - `GoogleSearchProvider`: secondary, Google Custom Search JSON API
//! - `FallbackSearch`: tries the primary, falls back to the secondary once

pub mod fallback;
pub mod google;
pub mod tavily;

pub use fallback::FallbackSearch;
pub use google::{GoogleSearchConfig, GoogleSearchProvider};
pub use tavily::{TavilyConfig, TavilyProvider};

use essaycraft_error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A short retrieved text fragment with source attribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub content: String,
    /// URL the fragment came from; empty when the provider didn't say
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
}

impl Snippet {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: String::new(),
            title: String::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Build a snippet from optional provider fields, dropping blank content.
    pub(crate) fn from_parts(
        content: Option<String>,
        source: Option<String>,
        title: Option<String>,
    ) -> Option<Self> {
        let content = content?.trim().to_string();
        if content.is_empty() {
            return None;
        }
        Some(Self {
            content,
            source: source.unwrap_or_default(),
            title: title.unwrap_or_default(),
        })
    }
}

/// The retrieval capability
#[allow(async_fn_in_trait)]
pub trait SearchProvider: Send + Sync {
    /// Provider name for logs and error context
    fn name(&self) -> &str;

    /// Return up to `max_results` snippets for `query`, best first
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Snippet>>;
}

/// Reject queries no provider could answer before spending a request on them.
pub(crate) fn validate_query(query: &str, operation: &'static str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(Error::invalid_argument("search query is empty").with_operation(operation));
    }
    Ok(())
}
