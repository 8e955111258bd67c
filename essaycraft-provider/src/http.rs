//! Shared HTTP plumbing for the reqwest-backed providers

use essaycraft_error::{Error, ErrorKind, Result};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

/// Build a client with the given request timeout.
pub(crate) fn build_client(timeout_secs: u64, provider: &'static str) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| {
            Error::config_invalid("http_client", "failed to create HTTP client")
                .with_operation("http::build_client")
                .with_context("provider", provider)
                .set_source(e)
        })
}

/// Map a transport-level reqwest failure.
pub(crate) fn transport_error(err: reqwest::Error, operation: &'static str) -> Error {
    let message = if err.is_timeout() {
        "request timed out".to_string()
    } else {
        err.to_string()
    };
    Error::network_failed(message)
        .with_operation(operation)
        .set_source(err)
}

/// Turn a non-success response into an error, passing successful ones through.
///
/// `failure_kind` is used for statuses that have no more specific mapping.
pub(crate) async fn check_status(
    response: Response,
    provider: &'static str,
    operation: &'static str,
    failure_kind: ErrorKind,
) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();

    let err = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::authentication_failed(provider),
        StatusCode::TOO_MANY_REQUESTS => Error::rate_limited(retry_after),
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => Error::new(
            ErrorKind::ProviderUnavailable,
            format!("{} is unavailable", provider),
        ),
        _ => Error::new(failure_kind, format!("{} returned HTTP {}", provider, status.as_u16())),
    };

    Err(err
        .with_operation(operation)
        .with_context("status", status.as_u16().to_string())
        .with_context("body", truncate(&body, 300)))
}

/// Decode a JSON body, reporting the provider on failure.
pub(crate) async fn decode_json<T: serde::de::DeserializeOwned>(
    response: Response,
    operation: &'static str,
) -> Result<T> {
    response.json::<T>().await.map_err(|e| {
        Error::parse_failed("response body is not the expected JSON")
            .with_operation(operation)
            .set_source(e)
    })
}

pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
