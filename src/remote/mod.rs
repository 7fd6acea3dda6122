//! Blocking HTTP clients for the audit and identity services.
//!
//! Requests are sent unsigned. Point the profile endpoints at a signing
//! proxy when talking to a real tenancy.

mod audit;
mod identity;

pub use audit::{event_query, HttpAuditSource, AUDIT_API_VERSION};
pub use identity::{HttpCompartmentSource, IDENTITY_API_VERSION};

use reqwest::blocking::{Client, Response};
use reqwest::header::HeaderMap;
use serde::Deserialize;
use std::time::Duration;

use crate::extract::FetchError;

/// Response header carrying the continuation token.
pub const NEXT_PAGE_HEADER: &str = "opc-next-page";

const USER_AGENT: &str = concat!("ocitools/", env!("CARGO_PKG_VERSION"));

/// Build the shared HTTP client with a per-request timeout.
pub fn build_client(timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|err| FetchError::Unexpected(format!("http client build failed: {err}")))
}

/// Join a base endpoint and a path without doubling slashes.
pub fn join_url(endpoint: &str, path: &str) -> String {
    format!(
        "{}/{}",
        endpoint.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Continuation token from response headers, empty values treated as absent.
pub fn next_page_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(NEXT_PAGE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Deserialize)]
struct WireServiceError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Turn an error status and its body into a `FetchError::Service`.
///
/// The body is normally `{"code": ..., "message": ...}`; anything else is
/// kept verbatim as the message.
pub fn service_error(status: u16, body: &str) -> FetchError {
    match serde_json::from_str::<WireServiceError>(body) {
        Ok(wire) if wire.code.is_some() || wire.message.is_some() => FetchError::Service {
            status,
            code: wire.code,
            message: wire.message.unwrap_or_default(),
        },
        _ => FetchError::Service {
            status,
            code: None,
            message: body.trim().to_string(),
        },
    }
}

fn transport_error(err: reqwest::Error) -> FetchError {
    if err.is_decode() {
        FetchError::Decode(err.to_string())
    } else {
        FetchError::Transport(err.to_string())
    }
}

/// Send a request and fail on non-success statuses.
fn send(request: reqwest::blocking::RequestBuilder) -> Result<Response, FetchError> {
    let response = request.send().map_err(transport_error)?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(service_error(status.as_u16(), &body))
}

fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, FetchError> {
    let body = response.text().map_err(transport_error)?;
    serde_json::from_str(&body).map_err(|err| FetchError::Decode(err.to_string()))
}
