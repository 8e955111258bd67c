//! The Error type shared by every essaycraft crate

use crate::{ErrorKind, ErrorStatus};
use std::fmt;

/// One failure, with enough attached to find where it came from.
///
/// `operation` names the innermost step that noticed the failure; wrapping
/// it again with [`Error::with_operation`] keeps the old name in the context
/// under `called`, so a research failure reads like a short call chain.
///
/// ```rust
/// use essaycraft_error::{Error, ErrorKind};
///
/// let err = Error::inference_failed("model returned empty text")
///     .with_operation("openai::complete")
///     .with_operation("writer::generate")
///     .with_context("revision", "2");
///
/// assert_eq!(err.kind(), ErrorKind::InferenceFailed);
/// assert_eq!(err.operation(), "writer::generate");
/// assert_eq!(err.context_value("called"), Some("openai::complete"));
/// assert!(err.is_retryable());
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: ErrorStatus,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Error {
    /// Status starts out `Temporary` for transient kinds, `Permanent` otherwise.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: if kind.is_retryable() {
                ErrorStatus::Temporary
            } else {
                ErrorStatus::Permanent
            },
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> ErrorStatus {
        self.status
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Context pairs in the order they were attached
    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    /// Most recently attached value for `key`
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_retryable(&self) -> bool {
        self.status.is_retryable()
    }

    pub fn with_operation(mut self, operation: &'static str) -> Self {
        if !self.operation.is_empty() {
            self.context.push(("called", self.operation.to_string()));
        }
        self.operation = operation;
        self
    }

    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Attach the lower-level error this one wraps. Set it once.
    pub fn set_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "source error already set");
        self.source = Some(source.into());
        self
    }

    /// We gave up on this error; a `Temporary` one becomes `Persistent`.
    pub fn persist(mut self) -> Self {
        self.status = self.status.persist();
        self
    }

    fn write_head(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.status)?;
        if !self.operation.is_empty() {
            write!(f, " at {}", self.operation)?;
        }
        Ok(())
    }
}

// Single line, for logs and the CLI's "Error:" line
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_head(f)?;

        if !self.context.is_empty() {
            let pairs: Vec<String> = self
                .context
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect();
            write!(f, ", context {{ {} }}", pairs.join(", "))?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_head(f)?;
        writeln!(f)?;

        if !self.message.is_empty() {
            writeln!(f, "\n    Message: {}", self.message)?;
        }
        if !self.context.is_empty() {
            writeln!(f, "\n    Context:")?;
            for (key, value) in &self.context {
                writeln!(f, "        {}: {}", key, value)?;
            }
        }
        if let Some(source) = &self.source {
            writeln!(f, "\n    Source: {:#}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

// Local file IO only (topic prompt, --output); network errors go through the
// providers, which pick a kind themselves.
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IoFailed,
        };
        Error::new(kind, err.to_string())
            .with_operation("io")
            .set_source(err)
    }
}

impl Error {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }

    /// Records the offending setting under `setting`
    pub fn config_invalid(setting: &'static str, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, reason).with_context("setting", setting)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn inference_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InferenceFailed, message)
    }

    /// Keeps the server's `Retry-After` hint when it sent one
    pub fn rate_limited(retry_after: Option<u64>) -> Self {
        let err = Self::new(ErrorKind::RateLimited, "rate limited by backend");
        match retry_after {
            Some(secs) => err.with_context("retry_after_secs", secs.to_string()),
            None => err,
        }
    }

    pub fn authentication_failed(provider: impl Into<String>) -> Self {
        let provider = provider.into();
        Self::new(
            ErrorKind::AuthenticationFailed,
            format!("'{}' rejected the configured credentials", provider),
        )
        .with_context("provider", provider)
    }

    pub fn search_failed(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::SearchFailed, reason).with_context("query", query)
    }

    pub fn network_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkFailed, message)
    }

    pub fn parse_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseFailed, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_status_follows_kind() {
        let err = Error::search_failed("tides", "tavily and google both failed");
        assert_eq!(err.status(), ErrorStatus::Permanent);
        assert_eq!(err.message(), "tavily and google both failed");

        assert!(Error::rate_limited(None).is_retryable());
        assert!(!Error::authentication_failed("tavily").is_retryable());
    }

    #[test]
    fn test_operation_chain_lands_in_context() {
        let err = Error::network_failed("connection reset")
            .with_operation("tavily::search")
            .with_operation("writer::research")
            .with_context("stage", "research");

        assert_eq!(err.operation(), "writer::research");
        assert_eq!(
            err.context(),
            &[
                ("called", "tavily::search".to_string()),
                ("stage", "research".to_string())
            ]
        );
    }

    #[test]
    fn test_context_value_prefers_latest() {
        let err = Error::unexpected("x")
            .with_context("revision", "1")
            .with_context("revision", "2");
        assert_eq!(err.context_value("revision"), Some("2"));
        assert_eq!(err.context_value("missing"), None);
    }

    #[test]
    fn test_persist_stops_retrying() {
        let err = Error::network_failed("connection refused").persist();
        assert_eq!(err.status(), ErrorStatus::Persistent);
        assert!(!err.is_retryable());

        let err = Error::invalid_argument("blank").persist();
        assert_eq!(err.status(), ErrorStatus::Permanent);
    }

    #[test]
    fn test_display_is_one_line() {
        let err = Error::inference_failed("model unavailable")
            .with_operation("openai::complete")
            .with_context("model", "mistral")
            .with_context("status", "503");

        assert_eq!(
            err.to_string(),
            "InferenceFailed (temporary) at openai::complete, \
             context { model: mistral, status: 503 } => model unavailable"
        );
        assert_eq!(
            Error::unexpected("boom").to_string(),
            "Unexpected (permanent) => boom"
        );
    }

    #[test]
    fn test_constructors_attach_context() {
        assert_eq!(
            Error::rate_limited(Some(30)).context_value("retry_after_secs"),
            Some("30")
        );
        assert!(Error::rate_limited(None).context().is_empty());
        assert_eq!(
            Error::search_failed("rust ownership", "down").context_value("query"),
            Some("rust ownership")
        );
        let err = Error::config_invalid("model", "must not be empty");
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_eq!(err.context_value("setting"), Some("model"));
    }

    #[test]
    fn test_io_error_conversion() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file").into();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert_eq!(err.operation(), "io");
        assert!(err.source().is_some());

        let err: Error = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert_eq!(err.kind(), ErrorKind::IoFailed);
    }
}
