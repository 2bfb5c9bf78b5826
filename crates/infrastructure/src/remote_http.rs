use std::time::Duration;

use reclaim_core::{AppError, AppResult};
use serde::de::DeserializeOwned;

/// Per-request timeout applied to every remote call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the shared HTTP client used by all remote adapters.
pub fn build_http_client() -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))
}

/// Sends a request and converts non-success statuses into classified errors.
pub(crate) async fn send(
    request: reqwest::RequestBuilder,
    operation: &str,
) -> AppResult<reqwest::Response> {
    let response = request.send().await.map_err(|error| {
        AppError::Transient(format!("{operation} transport error: {error}"))
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<response body unavailable>".to_owned());

    Err(AppError::from_status(
        status.as_u16(),
        format!("{operation} failed: {}", truncate(body.as_str(), 512)),
    ))
}

/// Decodes a JSON response body.
pub(crate) async fn read_json<T>(response: reqwest::Response, operation: &str) -> AppResult<T>
where
    T: DeserializeOwned,
{
    response.json::<T>().await.map_err(|error| {
        AppError::Parse(format!("failed to decode {operation} response body: {error}"))
    })
}

fn truncate(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((index, _)) => &value[..index],
        None => value,
    }
}
