//! Shared HTTP plumbing for the vendor backends.

use std::time::Duration;

use reqwest::blocking::{Client, Response};

use super::types::BackendError;

/// Timeout for one synthesis request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Build the blocking client used by every backend.
pub fn http_client() -> Result<Client, BackendError> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| BackendError::ConnectionFailed(e.to_string()))
}

/// Turn a non-success status into an error carrying the response body.
pub fn check_status(response: Response, action: &str) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    let detail = body.trim();
    if detail.is_empty() {
        Err(BackendError::RequestFailed(format!("{action} failed: {status}")))
    } else {
        Err(BackendError::RequestFailed(format!(
            "{action} failed: {status}: {detail}"
        )))
    }
}
