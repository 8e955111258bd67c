//! Writer implementation - drives the plan/research/generate/reflect loop

use crate::state::{EssayState, Stage};
use essaycraft_error::{Error, Result};
use essaycraft_provider::{CompletionProvider, SearchProvider, UsageTracker};
use serde::Serialize;

/// Configuration for the writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    /// Critique-driven rewrites after the first draft
    pub max_revisions: u32,
    /// Search queries kept from each research step
    pub max_queries: usize,
    /// Snippets requested per query
    pub results_per_query: usize,
    /// Cap on generated tokens per LLM call; the backend default when unset
    pub max_tokens: Option<usize>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            max_revisions: 3,
            max_queries: 3,
            results_per_query: 2,
            max_tokens: None,
        }
    }
}

impl WriterConfig {
    pub fn with_max_revisions(mut self, max: u32) -> Self {
        self.max_revisions = max;
        self
    }

    pub fn with_max_queries(mut self, max: usize) -> Self {
        self.max_queries = max;
        self
    }

    pub fn with_results_per_query(mut self, n: usize) -> Self {
        self.results_per_query = n;
        self
    }

    pub fn with_max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_queries == 0 {
            return Err(Error::config_invalid("max_queries", "must be at least 1"));
        }
        if self.results_per_query == 0 {
            return Err(Error::config_invalid("results_per_query", "must be at least 1"));
        }
        if self.max_tokens == Some(0) {
            return Err(Error::config_invalid("max_tokens", "must be at least 1"));
        }
        Ok(())
    }
}

/// One executed step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub stage: Stage,
    /// Revision count after the step ran
    pub revision: u32,
    pub summary: String,
}

/// Owns the providers and runs one essay at a time
pub struct EssayWriter<C, S> {
    pub(crate) llm: C,
    pub(crate) search: S,
    pub(crate) config: WriterConfig,
    pub(crate) usage: UsageTracker,
    trace: Vec<StepRecord>,
}

impl<C: CompletionProvider, S: SearchProvider> EssayWriter<C, S> {
    pub fn new(llm: C, search: S) -> Self {
        Self::with_config(llm, search, WriterConfig::default())
    }

    pub fn with_config(llm: C, search: S, config: WriterConfig) -> Self {
        Self {
            llm,
            search,
            config,
            usage: UsageTracker::new(),
            trace: Vec::new(),
        }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    pub fn llm(&self) -> &C {
        &self.llm
    }

    pub fn search(&self) -> &S {
        &self.search
    }

    /// Token usage accumulated across runs
    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    /// Steps executed by the last run
    pub fn trace(&self) -> &[StepRecord] {
        &self.trace
    }

    /// Write an essay on `topic`, returning the final state.
    ///
    /// Any provider error aborts the run; the search fallback is the only
    /// recovery and happens inside the search provider.
    pub async fn write(&mut self, topic: &str) -> Result<EssayState> {
        self.config.validate()?;
        let mut state = EssayState::new(topic, self.config.max_revisions)?;
        self.trace.clear();

        tracing::info!(
            topic = %state.topic,
            max_revisions = state.max_revisions(),
            "starting essay generation"
        );

        let mut stage = Stage::Plan;
        while !stage.is_terminal() {
            let summary = self.run_stage(stage, &mut state).await.map_err(|e| {
                e.with_context("stage", stage.as_str())
                    .with_context("revision", state.revision().to_string())
            })?;

            self.trace.push(StepRecord {
                index: self.trace.len() + 1,
                stage,
                revision: state.revision(),
                summary,
            });

            let next = stage.next(state.revision(), state.max_revisions());
            if stage == Stage::Reflect {
                if next.is_terminal() {
                    tracing::info!(revision = state.revision(), "max revisions reached");
                } else {
                    tracing::info!(revision = state.revision(), "continuing to next revision");
                }
            }
            stage = next;
        }

        tracing::info!(
            revisions = state.revision(),
            steps = self.trace.len(),
            total_tokens = self.usage.total_tokens(),
            "essay generation complete"
        );

        Ok(state)
    }

    async fn run_stage(&mut self, stage: Stage, state: &mut EssayState) -> Result<String> {
        match stage {
            Stage::Plan => self.plan(state).await,
            Stage::Research => self.research(state).await,
            Stage::Generate => self.generate(state).await,
            Stage::Reflect => self.reflect(state).await,
            Stage::Done => Ok(String::new()),
        }
    }
}
