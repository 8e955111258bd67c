//! # essaycraft-provider
//!
//! The two external capabilities an essay run depends on:
//! - **Completion**: "given a prompt, return generated text" via any
//!   OpenAI-compatible server (`/completions` or `/chat/completions`)
//! - **Search**: "given a query, return ranked snippets" via Tavily with an
//!   optional Google Custom Search fallback
//!
//! Both are traits so the pipeline can be driven by the scripted providers in
//! [`mock`] during tests.

pub mod completion;
pub mod search;
pub mod mock;
mod http;

pub use essaycraft_error::{Error, ErrorKind, ErrorStatus, Result};

pub use completion::{
    ApiStyle, ChatMessage, CompletionProvider, CompletionRequest, CompletionResponse,
    OpenAICompatProvider, ProviderConfig, Role, Usage, UsageTracker,
};
pub use search::{
    FallbackSearch, GoogleSearchConfig, GoogleSearchProvider, SearchProvider, Snippet,
    TavilyConfig, TavilyProvider,
};
