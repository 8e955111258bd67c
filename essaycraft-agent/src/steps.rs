//! The four pipeline steps
//!
//! Each step reads what it needs from the state, makes its LLM (and search)
//! calls and writes its result back. The returned string is a short summary
//! for the trace.

use crate::prompts;
use crate::state::EssayState;
use crate::writer::EssayWriter;
use essaycraft_error::{Error, Result};
use essaycraft_provider::{ChatMessage, CompletionProvider, CompletionRequest, SearchProvider};

impl<C: CompletionProvider, S: SearchProvider> EssayWriter<C, S> {
    /// Send one request, record its usage and return the trimmed text, which
    /// may be empty.
    async fn complete_text(
        &mut self,
        messages: Vec<ChatMessage>,
        operation: &'static str,
    ) -> Result<String> {
        let mut request = CompletionRequest::new(messages);
        if let Some(max) = self.config.max_tokens {
            request = request.with_max_tokens(max);
        }

        let response = self
            .llm
            .complete(request)
            .await
            .map_err(|e| e.with_operation(operation))?;

        self.usage.track(&response.model, &response.usage);
        Ok(response.content.map(|t| t.trim().to_string()).unwrap_or_default())
    }

    /// Like `complete_text`, but an empty answer is an `InferenceFailed`.
    async fn ask(&mut self, messages: Vec<ChatMessage>, operation: &'static str) -> Result<String> {
        let text = self.complete_text(messages, operation).await?;
        if text.is_empty() {
            return Err(Error::inference_failed("model returned no text")
                .with_operation(operation)
                .with_context("provider", self.llm.name())
                .with_context("model", self.llm.default_model()));
        }
        Ok(text)
    }

    pub(crate) async fn plan(&mut self, state: &mut EssayState) -> Result<String> {
        tracing::info!(topic = %state.topic, "planning essay");

        state.outline = self
            .ask(prompts::plan_messages(state), "writer::plan")
            .await?;

        tracing::debug!(outline = %state.outline, "outline ready");
        Ok(format!("outline of {} lines", state.outline.lines().count()))
    }

    /// Ask for queries, search each in order and append every snippet. An
    /// answer with no usable query adds nothing and is not an error.
    pub(crate) async fn research(&mut self, state: &mut EssayState) -> Result<String> {
        let answer = self
            .complete_text(
                prompts::research_messages(state, self.config.max_queries),
                "writer::research",
            )
            .await?;

        let queries = prompts::parse_queries(&answer, self.config.max_queries);
        if queries.is_empty() {
            tracing::warn!("model proposed no search queries");
        }

        let mut added = 0;
        for query in &queries {
            tracing::info!(query = %query, "researching");
            let snippets = self
                .search
                .search(query, self.config.results_per_query)
                .await
                .map_err(|e| e.with_operation("writer::research"))?;
            added += state.add_research(snippets);
        }

        tracing::info!(
            queries = queries.len(),
            snippets = added,
            total = state.research.len(),
            "research complete"
        );
        Ok(format!("{} queries, {} snippets", queries.len(), added))
    }

    /// Write the first draft, or a revision once a critique exists.
    pub(crate) async fn generate(&mut self, state: &mut EssayState) -> Result<String> {
        let revising = state.has_draft();
        if revising && !state.can_revise() {
            return Err(Error::unexpected("no revisions left to generate")
                .with_operation("writer::generate")
                .with_context("revision", state.revision().to_string()));
        }

        tracing::info!(revision = state.revision(), revising, "generating draft");
        let draft = self
            .ask(prompts::generate_messages(state), "writer::generate")
            .await?;

        state.draft = draft;
        if revising {
            state.record_revision()?;
        }

        tracing::debug!(chars = state.draft.len(), "draft ready");
        Ok(if revising {
            format!("revision {}", state.revision())
        } else {
            "first draft".to_string()
        })
    }

    pub(crate) async fn reflect(&mut self, state: &mut EssayState) -> Result<String> {
        tracing::info!(revision = state.revision(), "reflecting on draft");

        state.critique = self
            .ask(prompts::reflect_messages(state), "writer::reflect")
            .await?;

        tracing::debug!(critique = %state.critique, "critique ready");
        Ok(format!("critique of {} chars", state.critique.len()))
    }
}

#[cfg(test)]
mod tests {
    use crate::state::EssayState;
    use crate::writer::{EssayWriter, WriterConfig};
    use essaycraft_error::ErrorKind;
    use essaycraft_provider::mock::{MockCompletionProvider, MockSearchProvider};
    use essaycraft_provider::Snippet;

    fn writer(llm: MockCompletionProvider) -> EssayWriter<MockCompletionProvider, MockSearchProvider> {
        EssayWriter::new(llm, MockSearchProvider::new("tavily"))
    }

    #[tokio::test]
    async fn test_plan_stores_trimmed_outline() {
        let mut w = writer(MockCompletionProvider::with_responses(["  I. Intro\nII. End \n"]));
        let mut state = EssayState::new("Glaciers", 1).unwrap();

        let summary = w.plan(&mut state).await.unwrap();

        assert_eq!(state.outline, "I. Intro\nII. End");
        assert_eq!(summary, "outline of 2 lines");
        assert_eq!(w.usage().total_calls, 1);
    }

    #[tokio::test]
    async fn test_blank_answer_is_inference_failure() {
        let mut w = writer(MockCompletionProvider::with_responses(["   "]));
        let mut state = EssayState::new("Glaciers", 1).unwrap();

        let err = w.plan(&mut state).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InferenceFailed);
        assert_eq!(err.operation(), "writer::plan");
        assert!(state.outline.is_empty());
    }

    #[tokio::test]
    async fn test_research_searches_each_query_in_order() {
        let mut w = EssayWriter::new(
            MockCompletionProvider::with_responses(["1. melt rates\n2. sea level\n3. albedo\n4. extra"]),
            MockSearchProvider::new("tavily")
                .with_results(vec![Snippet::new("a"), Snippet::new("b")])
                .with_results(vec![]),
        );
        let mut state = EssayState::new("Glaciers", 1).unwrap();

        let summary = w.research(&mut state).await.unwrap();

        assert_eq!(w.search().calls(), vec!["melt rates", "sea level", "albedo"]);
        let contents: Vec<&str> = state.research.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "b", "tavily on albedo"]);
        assert_eq!(summary, "3 queries, 3 snippets");
    }

    #[tokio::test]
    async fn test_research_blank_answer_searches_nothing() {
        let mut w = writer(MockCompletionProvider::with_responses(["\n  \n"]));
        let mut state = EssayState::new("Glaciers", 1).unwrap();

        let summary = w.research(&mut state).await.unwrap();

        assert_eq!(summary, "0 queries, 0 snippets");
        assert!(w.search().calls().is_empty());
        assert!(state.research.is_empty());
        assert_eq!(w.usage().total_calls, 1);
    }

    #[tokio::test]
    async fn test_research_marker_only_answer_searches_nothing() {
        let mut w = writer(MockCompletionProvider::with_responses(["-\n*\n1.\n"]));
        let mut state = EssayState::new("Glaciers", 1).unwrap();

        assert_eq!(w.research(&mut state).await.unwrap(), "0 queries, 0 snippets");
        assert!(w.search().calls().is_empty());
    }

    #[tokio::test]
    async fn test_max_tokens_sent_with_every_request() {
        let config = WriterConfig::default().with_max_tokens(800);
        let mut w = EssayWriter::with_config(
            MockCompletionProvider::with_responses(["outline", "critique"]),
            MockSearchProvider::new("tavily"),
            config,
        );
        let mut state = EssayState::new("Glaciers", 1).unwrap();
        state.draft = "An essay.".into();

        w.plan(&mut state).await.unwrap();
        w.reflect(&mut state).await.unwrap();

        assert!(w.llm().requests().iter().all(|r| r.max_tokens == Some(800)));

        let mut w = writer(MockCompletionProvider::with_responses(["outline"]));
        w.plan(&mut state).await.unwrap();
        assert_eq!(w.llm().requests()[0].max_tokens, None);
    }

    #[tokio::test]
    async fn test_generate_counts_only_revisions() {
        let mut w = writer(MockCompletionProvider::with_responses(["first", "second"]));
        let mut state = EssayState::new("Glaciers", 1).unwrap();

        assert_eq!(w.generate(&mut state).await.unwrap(), "first draft");
        assert_eq!(state.revision(), 0);

        state.critique = "More detail.".into();
        assert_eq!(w.generate(&mut state).await.unwrap(), "revision 1");
        assert_eq!(state.draft, "second");
        assert_eq!(state.revision(), 1);
    }

    #[tokio::test]
    async fn test_generate_refuses_past_budget_without_calling_llm() {
        let mut w = writer(MockCompletionProvider::new());
        let mut state = EssayState::new("Glaciers", 0).unwrap();
        state.draft = "existing".into();

        let err = w.generate(&mut state).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
        assert_eq!(w.llm().call_count(), 0);
        assert_eq!(state.draft, "existing");
    }

    #[tokio::test]
    async fn test_reflect_stores_critique() {
        let mut w = writer(MockCompletionProvider::with_responses(["Grade: B. Add sources."]));
        let mut state = EssayState::new("Glaciers", 1).unwrap();
        state.draft = "An essay.".into();

        w.reflect(&mut state).await.unwrap();

        assert_eq!(state.critique, "Grade: B. Add sources.");
        assert_eq!(w.llm().requests()[0].messages[1].content, "An essay.");
    }
}
