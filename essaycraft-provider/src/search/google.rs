//! Google Custom Search JSON API provider
//!
//! `GET https://www.googleapis.com/customsearch/v1?key=..&cx=..&q=..&num=..`,
//! snippets come from `items[].snippet`.

use super::*;
use crate::http;
use essaycraft_error::ErrorKind;
use reqwest::Client;

/// The API refuses `num` outside 1..=10.
const MAX_NUM: usize = 10;

#[derive(Debug, Clone)]
pub struct GoogleSearchConfig {
    pub api_key: String,
    /// Programmable Search Engine id (`cx`)
    pub engine_id: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl GoogleSearchConfig {
    pub fn new(api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            base_url: "https://www.googleapis.com/customsearch/v1".into(),
            timeout_secs: 30,
        }
    }

    /// Both halves must be present; either missing means "no fallback".
    pub fn from_parts(api_key: Option<String>, engine_id: Option<String>) -> Option<Self> {
        match (api_key, engine_id) {
            (Some(key), Some(cx)) if !key.trim().is_empty() && !cx.trim().is_empty() => {
                Some(Self::new(key, cx))
            }
            _ => None,
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

pub struct GoogleSearchProvider {
    client: Client,
    config: GoogleSearchConfig,
}

impl GoogleSearchProvider {
    pub fn new(config: GoogleSearchConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::config_invalid("google_api_key", "Google API key is empty"));
        }
        if config.engine_id.trim().is_empty() {
            return Err(Error::config_invalid("google_cse_id", "search engine id is empty"));
        }
        let client = http::build_client(config.timeout_secs, "google")?;
        Ok(Self { client, config })
    }

    fn query_params(&self, query: &str, max_results: usize) -> Vec<(&'static str, String)> {
        vec![
            ("key", self.config.api_key.clone()),
            ("cx", self.config.engine_id.clone()),
            ("q", query.to_string()),
            ("num", max_results.clamp(1, MAX_NUM).to_string()),
        ]
    }
}

impl SearchProvider for GoogleSearchProvider {
    fn name(&self) -> &str {
        "google"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Snippet>> {
        validate_query(query, "google::search")?;

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&self.query_params(query, max_results))
            .send()
            .await
            .map_err(|e| http::transport_error(e, "google::search"))?;
        let response =
            http::check_status(response, "google", "google::search", ErrorKind::SearchFailed)
                .await?;

        let body: GoogleResponse = http::decode_json(response, "google::search").await?;
        let snippets = body.into_snippets(max_results);

        tracing::debug!(query, results = snippets.len(), "google search finished");
        Ok(snippets)
    }
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    /// Absent entirely when the engine found nothing
    #[serde(default)]
    items: Vec<GoogleItem>,
}

#[derive(Debug, Deserialize)]
struct GoogleItem {
    snippet: Option<String>,
    link: Option<String>,
    title: Option<String>,
}

impl GoogleResponse {
    fn into_snippets(self, max_results: usize) -> Vec<Snippet> {
        self.items
            .into_iter()
            .filter_map(|item| Snippet::from_parts(item.snippet, item.link, item.title))
            .take(max_results)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_parts_requires_both() {
        assert!(GoogleSearchConfig::from_parts(Some("k".into()), None).is_none());
        assert!(GoogleSearchConfig::from_parts(None, Some("cx".into())).is_none());
        assert!(GoogleSearchConfig::from_parts(Some("k".into()), Some(" ".into())).is_none());

        let config = GoogleSearchConfig::from_parts(Some("k".into()), Some("cx".into())).unwrap();
        assert_eq!(config.engine_id, "cx");
    }

    #[test]
    fn test_query_params_clamp_num() {
        let provider = GoogleSearchProvider::new(GoogleSearchConfig::new("k", "cx")).unwrap();

        let params = provider.query_params("glaciers", 2);
        assert!(params.contains(&("q", "glaciers".to_string())));
        assert!(params.contains(&("num", "2".to_string())));

        let params = provider.query_params("glaciers", 50);
        assert!(params.contains(&("num", "10".to_string())));

        let params = provider.query_params("glaciers", 0);
        assert!(params.contains(&("num", "1".to_string())));
    }

    #[test]
    fn test_missing_engine_id_is_rejected() {
        let err = GoogleSearchProvider::new(GoogleSearchConfig::new("k", ""))
            .err()
            .unwrap();
        assert_eq!(err.context()[0], ("setting", "google_cse_id".to_string()));
    }

    #[test]
    fn test_parse_items() {
        let raw = r#"{
            "kind": "customsearch#search",
            "items": [
                {"title": "Glacier", "link": "https://a.example", "snippet": "Glaciers store 69% of fresh water."},
                {"title": "No snippet", "link": "https://b.example"}
            ]
        }"#;
        let body: GoogleResponse = serde_json::from_str(raw).unwrap();
        let snippets = body.into_snippets(2);

        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].source, "https://a.example");
    }

    #[test]
    fn test_parse_no_items() {
        let body: GoogleResponse =
            serde_json::from_str(r#"{"kind": "customsearch#search"}"#).unwrap();
        assert!(body.into_snippets(2).is_empty());
    }
}
