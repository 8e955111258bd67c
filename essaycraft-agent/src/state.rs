//! Essay state and the stage machine that moves it

use essaycraft_error::{Error, ErrorKind, Result};
use essaycraft_provider::Snippet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything one run knows about the essay.
///
/// `revision` counts drafts written in response to a critique; it starts at
/// zero and can never pass `max_revisions`. Deserializing checks the same
/// rules `new` and `record_revision` enforce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEssayState")]
pub struct EssayState {
    pub topic: String,
    pub outline: String,
    /// Append-only, in the order the searches ran
    pub research: Vec<Snippet>,
    pub draft: String,
    pub critique: String,
    revision: u32,
    max_revisions: u32,
}

impl EssayState {
    pub fn new(topic: &str, max_revisions: u32) -> Result<Self> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(Error::invalid_argument("essay topic cannot be empty")
                .with_operation("state::new"));
        }

        Ok(Self {
            topic: topic.to_string(),
            outline: String::new(),
            research: Vec::new(),
            draft: String::new(),
            critique: String::new(),
            revision: 0,
            max_revisions,
        })
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn max_revisions(&self) -> u32 {
        self.max_revisions
    }

    pub fn has_draft(&self) -> bool {
        !self.draft.trim().is_empty()
    }

    pub fn has_critique(&self) -> bool {
        !self.critique.trim().is_empty()
    }

    /// Whether another revision fits in the budget
    pub fn can_revise(&self) -> bool {
        self.revision < self.max_revisions
    }

    /// Count one revision, refusing to go past the budget.
    pub(crate) fn record_revision(&mut self) -> Result<u32> {
        if !self.can_revise() {
            return Err(Error::new(
                ErrorKind::Unexpected,
                "revision budget already spent",
            )
            .with_operation("state::record_revision")
            .with_context("revision", self.revision.to_string())
            .with_context("max_revisions", self.max_revisions.to_string()));
        }
        self.revision += 1;
        Ok(self.revision)
    }

    pub fn add_research(&mut self, snippets: impl IntoIterator<Item = Snippet>) -> usize {
        let before = self.research.len();
        self.research.extend(snippets);
        self.research.len() - before
    }

    /// Research notes as one block, separated by blank lines
    pub fn research_text(&self) -> String {
        self.research
            .iter()
            .map(|s| {
                if s.source.is_empty() {
                    s.content.clone()
                } else {
                    format!("{}\n(source: {})", s.content, s.source)
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[derive(Deserialize)]
struct RawEssayState {
    topic: String,
    #[serde(default)]
    outline: String,
    #[serde(default)]
    research: Vec<Snippet>,
    #[serde(default)]
    draft: String,
    #[serde(default)]
    critique: String,
    #[serde(default)]
    revision: u32,
    max_revisions: u32,
}

impl TryFrom<RawEssayState> for EssayState {
    type Error = Error;

    fn try_from(raw: RawEssayState) -> Result<Self> {
        if raw.revision > raw.max_revisions {
            return Err(Error::invalid_argument("revision is past the revision budget")
                .with_operation("state::deserialize")
                .with_context("revision", raw.revision.to_string())
                .with_context("max_revisions", raw.max_revisions.to_string()));
        }

        let mut state = EssayState::new(&raw.topic, raw.max_revisions)
            .map_err(|e| e.with_operation("state::deserialize"))?;
        state.outline = raw.outline;
        state.research = raw.research;
        state.draft = raw.draft;
        state.critique = raw.critique;
        state.revision = raw.revision;
        Ok(state)
    }
}

/// Where the writer is in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Plan,
    Research,
    Generate,
    Reflect,
    Done,
}

impl Stage {
    /// Plan → Research → Generate → Reflect → (Research while revisions
    /// remain, else Done).
    pub fn next(self, revision: u32, max_revisions: u32) -> Stage {
        match self {
            Stage::Plan => Stage::Research,
            Stage::Research => Stage::Generate,
            Stage::Generate => Stage::Reflect,
            Stage::Reflect if revision < max_revisions => Stage::Research,
            Stage::Reflect | Stage::Done => Stage::Done,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Plan => "plan",
            Stage::Research => "research",
            Stage::Generate => "generate",
            Stage::Reflect => "reflect",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
