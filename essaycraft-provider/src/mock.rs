//! Scripted providers for tests
//!
//! Both mocks record every call. Scripted answers are consumed in order;
//! once the script runs out they fall back to a deterministic default.

use crate::completion::{
    CompletionProvider, CompletionRequest, CompletionResponse, Usage,
};
use crate::search::{SearchProvider, Snippet};
use essaycraft_error::{Error, ErrorKind, Result};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

type Responder = Box<dyn Fn(&CompletionRequest) -> Result<String> + Send + Sync>;

// ============================================================================
// Completion
// ============================================================================

/// Completion provider that answers from a script or a responder function
pub struct MockCompletionProvider {
    model: String,
    script: Mutex<VecDeque<Result<String>>>,
    responder: Option<Responder>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockCompletionProvider {
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            script: Mutex::new(VecDeque::new()),
            responder: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer the given texts in order
    pub fn with_responses<I, T>(responses: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let provider = Self::new();
        for response in responses {
            provider.queue_response(response);
        }
        provider
    }

    /// Compute every unscripted answer from the request
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String> + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(responder));
        self
    }

    pub fn queue_response(&self, text: impl Into<String>) {
        lock(&self.script).push_back(Ok(text.into()));
    }

    pub fn queue_error(&self, error: Error) {
        lock(&self.script).push_back(Err(error));
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock(&self.requests).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

impl Default for MockCompletionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionProvider for MockCompletionProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let call = {
            let mut requests = lock(&self.requests);
            requests.push(request.clone());
            requests.len()
        };

        let scripted = lock(&self.script).pop_front();
        let text = match scripted {
            Some(answer) => answer?,
            None => match &self.responder {
                Some(responder) => responder(&request)?,
                None => format!("mock response {}", call),
            },
        };

        Ok(CompletionResponse {
            id: format!("mock-{}", call),
            model: self.model.clone(),
            content: Some(text).filter(|t| !t.trim().is_empty()),
            usage: Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
        })
    }
}

// ============================================================================
// Search
// ============================================================================

enum SearchMode {
    /// Unscripted calls get one generated snippet naming the query
    Echo,
    /// Unscripted calls fail with this kind
    Fail(ErrorKind),
}

/// Search provider that answers from a script
pub struct MockSearchProvider {
    name: String,
    script: Mutex<VecDeque<Result<Vec<Snippet>>>>,
    mode: SearchMode,
    calls: Mutex<Vec<(String, usize)>>,
}

impl MockSearchProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            mode: SearchMode::Echo,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail every unscripted call
    pub fn failing(name: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            mode: SearchMode::Fail(kind),
            ..Self::new(name)
        }
    }

    /// Queue one answer
    pub fn with_results(self, results: Vec<Snippet>) -> Self {
        lock(&self.script).push_back(Ok(results));
        self
    }

    /// Queue one failure
    pub fn with_error(self, error: Error) -> Self {
        lock(&self.script).push_back(Err(error));
        self
    }

    /// Queries received so far, in order
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).iter().map(|(q, _)| q.clone()).collect()
    }

    /// `max_results` received so far, in order
    pub fn max_results_seen(&self) -> Vec<usize> {
        lock(&self.calls).iter().map(|(_, n)| *n).collect()
    }
}

impl SearchProvider for MockSearchProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Snippet>> {
        lock(&self.calls).push((query.to_string(), max_results));

        if let Some(answer) = lock(&self.script).pop_front() {
            return answer;
        }

        match self.mode {
            SearchMode::Echo => Ok(vec![Snippet::new(format!("{} on {}", self.name, query))
                .with_source(format!("https://{}.example/search", self.name))]),
            SearchMode::Fail(kind) => Err(Error::new(kind, format!("{} is down", self.name))
                .with_operation("mock::search")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::ChatMessage;

    fn ask(provider: &MockCompletionProvider, messages: Vec<ChatMessage>) -> Result<Option<String>> {
        tokio_test::block_on(provider.complete(CompletionRequest::new(messages)))
            .map(|r| r.content)
    }

    #[test]
    fn test_completion_script_then_default() {
        let provider = MockCompletionProvider::with_responses(["outline", "  "]);
        let topic = || vec![ChatMessage::user("topic")];

        assert_eq!(ask(&provider, topic()).unwrap().as_deref(), Some("outline"));
        assert_eq!(ask(&provider, topic()).unwrap(), None);
        assert_eq!(
            ask(&provider, topic()).unwrap().as_deref(),
            Some("mock response 3")
        );
        assert_eq!(provider.call_count(), 3);
    }

    #[test]
    fn test_completion_scripted_error() {
        let provider = MockCompletionProvider::new();
        provider.queue_error(Error::rate_limited(None));

        let err = ask(&provider, vec![ChatMessage::user("topic")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert_eq!(provider.call_count(), 1);
    }

    #[test]
    fn test_completion_responder_sees_request() {
        let provider = MockCompletionProvider::new()
            .with_responder(|req| Ok(format!("{} messages", req.messages.len())));

        let text = ask(&provider, vec![ChatMessage::system("s"), ChatMessage::user("u")]).unwrap();

        assert_eq!(text.as_deref(), Some("2 messages"));
        assert_eq!(provider.requests()[0].messages[1].content, "u");
    }

    #[test]
    fn test_search_modes() {
        let echo = MockSearchProvider::new("tavily");
        let results = tokio_test::block_on(echo.search("tides", 2)).unwrap();
        assert_eq!(results[0].content, "tavily on tides");

        let down = MockSearchProvider::failing("google", ErrorKind::NetworkFailed)
            .with_results(vec![Snippet::new("scripted")]);
        assert_eq!(tokio_test::block_on(down.search("a", 1)).unwrap().len(), 1);
        let err = tokio_test::block_on(down.search("b", 1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkFailed);
        assert_eq!(down.calls(), vec!["a".to_string(), "b".to_string()]);
    }
}
