//! Primary/secondary search combinator
//!
//! The primary is asked first. An error or an empty answer hands the same
//! query to the secondary, once. Only a secondary error is terminal; an empty
//! secondary answer is passed through as "nothing found".

use super::*;
use essaycraft_error::ErrorKind;

pub struct FallbackSearch<P, S> {
    primary: P,
    secondary: Option<S>,
}

impl<P: SearchProvider, S: SearchProvider> FallbackSearch<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
        }
    }

    /// No fallback configured: the primary's answer is final.
    pub fn primary_only(primary: P) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn secondary(&self) -> Option<&S> {
        self.secondary.as_ref()
    }

    pub fn has_fallback(&self) -> bool {
        self.secondary.is_some()
    }
}

impl<P: SearchProvider, S: SearchProvider> SearchProvider for FallbackSearch<P, S> {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Snippet>> {
        validate_query(query, "search::fallback")?;
        tracing::info!(query, primary = self.primary.name(), "searching");

        let primary_failure = match self.primary.search(query, max_results).await {
            Ok(snippets) if !snippets.is_empty() => {
                tracing::info!(
                    provider = self.primary.name(),
                    results = snippets.len(),
                    "search successful"
                );
                return Ok(snippets);
            }
            Ok(_) => {
                tracing::warn!(provider = self.primary.name(), query, "search returned no results");
                None
            }
            Err(e) => {
                tracing::error!(provider = self.primary.name(), query, error = %e, "search failed");
                Some(e.persist())
            }
        };

        let Some(secondary) = &self.secondary else {
            return match primary_failure {
                Some(e) => Err(e.with_operation("search::fallback")),
                None => Ok(Vec::new()),
            };
        };

        tracing::info!(provider = secondary.name(), query, "falling back");
        match secondary.search(query, max_results).await {
            Ok(snippets) => {
                if snippets.is_empty() {
                    tracing::warn!(query, "both search providers came back empty");
                } else {
                    tracing::info!(
                        provider = secondary.name(),
                        results = snippets.len(),
                        "search successful"
                    );
                }
                Ok(snippets)
            }
            Err(e) => {
                tracing::error!(provider = secondary.name(), query, error = %e, "fallback search failed");
                let primary_reason = primary_failure
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "no results".to_string());

                Err(Error::new(
                    ErrorKind::SearchFailed,
                    format!(
                        "{} and {} both failed",
                        self.primary.name(),
                        secondary.name()
                    ),
                )
                .with_operation("search::fallback")
                .with_context("query", query)
                .with_context("primary", primary_reason)
                .with_context("secondary", e.to_string())
                .set_source(e))
            }
        }
    }
}
