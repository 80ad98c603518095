//! Shared HTTP response helpers for the model client.
//!
//! Maps status codes and transport errors onto [`ContractError`] so the
//! retry loop can classify them with [`ContractError::is_retryable`].

use contracts::ContractError;

/// Fallback wait when a 429 carries no usable `Retry-After`
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Longest error body kept in a [`ContractError::ModelApi`] message
const MAX_ERROR_BODY: usize = 512;

/// Check an HTTP response for common error conditions.
///
/// Returns the response unchanged on success. Handles:
/// - **429 Too Many Requests** → [`ContractError::RateLimited`] with
///   `Retry-After` parsing (60 s when absent or unparseable).
/// - **Non-success status** → [`ContractError::ModelApi`] with status code
///   and (truncated) response body.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ContractError> {
    if resp.status() == 429 {
        return Err(ContractError::RateLimited {
            retry_after_secs: parse_retry_after(&resp),
        });
    }
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let mut message = resp.text().await.unwrap_or_default();
        truncate_at_char(&mut message, MAX_ERROR_BODY);
        return Err(ContractError::ModelApi { status, message });
    }
    Ok(resp)
}

/// Classify a reqwest error that happened before a status was available.
///
/// The URL is dropped from the message; it may carry the API key.
pub fn transport_error(err: reqwest::Error, timeout_secs: u64) -> ContractError {
    if err.is_timeout() {
        ContractError::ModelTimeout { timeout_secs }
    } else if err.is_decode() {
        ContractError::MalformedResponse {
            message: err.without_url().to_string(),
        }
    } else {
        ContractError::ModelTransport {
            message: err.without_url().to_string(),
        }
    }
}

/// Parse the `Retry-After` header as seconds.
fn parse_retry_after(resp: &reqwest::Response) -> u64 {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

fn truncate_at_char(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}
