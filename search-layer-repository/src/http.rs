//! Helpers shared by the `reqwest` based backend clients.

use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use tracing::error;
use url::Url;

use crate::errors::SearchError;

/// Join percent-encoded path segments onto a base URL.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, SearchError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| SearchError::config(format!("{} cannot be used as a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Send a request and fail with the response body unless the status is a
/// success (or one of `allowed`).
pub(crate) async fn send(
    request: RequestBuilder,
    operation: &str,
    allowed: &[u16],
) -> Result<Response, SearchError> {
    let response = request
        .send()
        .await
        .map_err(|e| SearchError::connection(e.to_string()))?;

    let status = response.status();
    if status.is_success() || allowed.contains(&status.as_u16()) {
        return Ok(response);
    }

    let error_body = response.text().await.unwrap_or_default();
    error!(status = %status, body = %error_body, "{} request failed", operation);
    Err(SearchError::backend(format!(
        "{} failed with status {}: {}",
        operation, status, error_body
    )))
}

/// Decode a JSON response body.
pub(crate) async fn json(response: Response) -> Result<Value, SearchError> {
    response
        .json::<Value>()
        .await
        .map_err(|e| SearchError::parse(e.to_string()))
}
