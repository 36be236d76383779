use reqwest::StatusCode;
use reqwest::blocking::{RequestBuilder, Response};
use thiserror::Error;

/// Why an outbound HTTP call did not produce a usable response.
#[derive(Debug, Error)]
pub enum RequestFailure {
    #[error("{0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Api { status: StatusCode, body: String },
}

/// Sends a request once and turns non-success statuses into
/// [`RequestFailure::Api`]. There is no retry.
pub(crate) fn send_once(request: RequestBuilder) -> Result<Response, RequestFailure> {
    let response = request.send()?;
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().unwrap_or_default();
    Err(RequestFailure::Api {
        status,
        body: truncate_body(body),
    })
}

fn truncate_body(body: String) -> String {
    const LIMIT: usize = 512;
    if body.len() <= LIMIT {
        return body;
    }
    let mut end = LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
