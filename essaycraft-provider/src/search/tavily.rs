//! Tavily search provider
//!
//! `POST https://api.tavily.com/search`, snippets come from `results[].content`.

use super::*;
use crate::http;
use essaycraft_error::ErrorKind;
use reqwest::Client;

#[derive(Debug, Clone)]
pub struct TavilyConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl TavilyConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.tavily.com".into(),
            timeout_secs: 30,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

pub struct TavilyProvider {
    client: Client,
    config: TavilyConfig,
}

impl TavilyProvider {
    pub fn new(config: TavilyConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::config_invalid("tavily_api_key", "Tavily API key is empty"));
        }
        let client = http::build_client(config.timeout_secs, "tavily")?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/search", self.config.base_url.trim_end_matches('/'))
    }
}

impl SearchProvider for TavilyProvider {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Snippet>> {
        validate_query(query, "tavily::search")?;

        let request = TavilyRequest {
            api_key: &self.config.api_key,
            query,
            max_results,
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| http::transport_error(e, "tavily::search"))?;
        let response =
            http::check_status(response, "tavily", "tavily::search", ErrorKind::SearchFailed)
                .await?;

        let body: TavilyResponse = http::decode_json(response, "tavily::search").await?;
        let snippets = body.into_snippets(max_results);

        tracing::debug!(query, results = snippets.len(), "tavily search finished");
        Ok(snippets)
    }
}

#[derive(Debug, serde::Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    content: Option<String>,
    url: Option<String>,
    title: Option<String>,
}

impl TavilyResponse {
    fn into_snippets(self, max_results: usize) -> Vec<Snippet> {
        self.results
            .into_iter()
            .filter_map(|r| Snippet::from_parts(r.content, r.url, r.title))
            .take(max_results)
            .collect()
    }
}
