//! # essaycraft-error
//!
//! One error type for the whole workspace.
//!
//! - [`ErrorKind`] says what happened; callers match on it.
//! - [`ErrorStatus`] says whether trying again could help. The search
//!   fallback `persist()`s a primary failure it has given up on.
//! - Context pairs and the operation chain say where it happened.
//! - Lower-level errors (reqwest, serde_json, io) are kept as the source
//!   instead of being converted into public variants.
//!
//! ```rust
//! use essaycraft_error::{Error, ErrorKind, Result};
//!
//! fn search(query: &str) -> Result<Vec<String>> {
//!     Err(Error::search_failed(query, "no provider answered")
//!         .with_operation("search::fallback")
//!         .with_context("primary", "tavily"))
//! }
//!
//! let err = search("history of the printing press").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::SearchFailed);
//! ```
//!
//! Handle an error once; code further up only adds context.

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

pub type Result<T> = std::result::Result<T, Error>;
