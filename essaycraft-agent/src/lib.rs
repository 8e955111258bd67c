//! # essaycraft Agent
//!
//! The writer drives one essay through a fixed pipeline:
//! 1. **Plan**: the LLM outlines the essay
//! 2. **Research**: the LLM proposes search queries, each is searched and the
//!    snippets are kept as research notes
//! 3. **Generate**: the LLM writes (or rewrites) the draft from outline + notes
//! 4. **Reflect**: the LLM grades the draft
//! 5. Back to Research until the revision budget is spent
//!
//! The LLM does the writing; the loop only moves state between steps.

mod prompts;
mod state;
mod steps;
mod writer;

pub use prompts::parse_queries;
pub use state::{EssayState, Stage};
pub use writer::{EssayWriter, StepRecord, WriterConfig};
