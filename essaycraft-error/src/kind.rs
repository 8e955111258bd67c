//! What went wrong

use std::fmt;

/// Category of an [`Error`](crate::Error).
///
/// Callers match on the kind; the message and context are for humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Catch-all for states the code believes impossible
    Unexpected,
    /// A setting is missing or malformed
    ConfigInvalid,
    /// A caller passed something unusable (blank topic, blank query)
    InvalidArgument,

    // completion backend
    /// The model call failed or produced no text
    InferenceFailed,
    /// HTTP 429
    RateLimited,
    /// HTTP 401 / 403
    AuthenticationFailed,
    /// HTTP 502 / 503
    ProviderUnavailable,

    // search backends
    /// No search provider could answer a query
    SearchFailed,

    // transport and local IO
    NetworkFailed,
    /// A response body or input did not have the expected shape
    ParseFailed,
    IoFailed,
    FileNotFound,
    PermissionDenied,
}

impl ErrorKind {
    /// Kinds that usually clear up on their own start out `Temporary`.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::InferenceFailed
                | ErrorKind::NetworkFailed
                | ErrorKind::RateLimited
                | ErrorKind::ProviderUnavailable
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display_is_variant_name() {
        assert_eq!(ErrorKind::SearchFailed.to_string(), "SearchFailed");
        assert_eq!(ErrorKind::RateLimited.to_string(), "RateLimited");
    }

    #[test]
    fn test_transient_kinds() {
        assert!(ErrorKind::NetworkFailed.is_retryable());
        assert!(ErrorKind::ProviderUnavailable.is_retryable());
        assert!(!ErrorKind::AuthenticationFailed.is_retryable());
        assert!(!ErrorKind::SearchFailed.is_retryable());
        assert!(!ErrorKind::ConfigInvalid.is_retryable());
    }
}
