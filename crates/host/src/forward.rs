//! Relays manuscript submissions to the hosted app's processing API.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const MAX_RESPONSE_BYTES: usize = 10 * 1024 * 1024;
/// Relative to the embed target
pub const API_PATH: &str = "api/process";

#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("Failed to create HTTP client")]
    Client(#[source] reqwest::Error),
    #[error("Remote application unavailable")]
    RemoteUnavailable(#[source] reqwest::Error),
    #[error("Remote response exceeds maximum size ({size} bytes > {max} bytes)")]
    ResponseTooLarge { size: usize, max: usize },
}

impl ForwardError {
    fn code(&self) -> &'static str {
        match self {
            ForwardError::Client(_) => "arc_crusade_client",
            ForwardError::RemoteUnavailable(_) => "arc_crusade_remote_unavailable",
            ForwardError::ResponseTooLarge { .. } => "arc_crusade_response_too_large",
        }
    }
}

/// Error body in the host platform's REST error shape
pub fn error_body(code: &str, message: &str, status: StatusCode) -> serde_json::Value {
    serde_json::json!({
        "code": code,
        "message": message,
        "data": { "status": status.as_u16() },
    })
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let status = StatusCode::BAD_GATEWAY;
        let body = error_body(self.code(), &self.to_string(), status);
        (status, axum::Json(body)).into_response()
    }
}

/// What the remote answered, passed back to the caller unchanged.
#[derive(Debug, Clone)]
pub struct Forwarded {
    pub status: u16,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl IntoResponse for Forwarded {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        let mut response = (status, self.body).into_response();
        let content_type = self.content_type
            .unwrap_or_else(|| HeaderValue::from_static("application/json"));
        response.headers_mut().insert(header::CONTENT_TYPE, content_type);
        response
    }
}

/// One pooled client posting JSON to a fixed URL.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    url: Url,
    max_bytes: usize,
}

impl Forwarder {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, ForwardError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(ForwardError::Client)?;
        Ok(Forwarder { client, url, max_bytes: MAX_RESPONSE_BYTES })
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Post `payload` and collect the reply. Any status from the remote is a
    /// successful forward; only transport failures and oversized bodies are errors.
    pub async fn forward(&self, payload: &serde_json::Value) -> Result<Forwarded, ForwardError> {
        debug!("forwarding submission to {}", self.url);
        let mut response = self.client.post(self.url.clone())
            .json(payload)
            .send()
            .await
            .map_err(ForwardError::RemoteUnavailable)?;

        let status = response.status().as_u16();
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();

        if let Some(len) = response.content_length() {
            let size = usize::try_from(len).unwrap_or(usize::MAX);
            if size > self.max_bytes {
                return Err(ForwardError::ResponseTooLarge { size, max: self.max_bytes });
            }
        }

        // Read body with size cap
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(ForwardError::RemoteUnavailable)? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(ForwardError::ResponseTooLarge { size: body.len() + chunk.len(), max: self.max_bytes });
            }
            body.extend_from_slice(&chunk);
        }

        info!("remote answered {} with {} bytes", status, body.len());
        Ok(Forwarded { status, content_type, body: Bytes::from(body) })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_bad_gateway() {
        let response = ForwardError::ResponseTooLarge { size: 11, max: 10 }.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn error_body_shape() {
        let body = error_body("some_code", "went wrong", StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "some_code");
        assert_eq!(body["message"], "went wrong");
        assert_eq!(body["data"]["status"], 403);
    }

    #[test]
    fn forwarded_keeps_status_and_type() {
        let response = Forwarded {
            status: 422,
            content_type: Some(HeaderValue::from_static("text/plain")),
            body: Bytes::from_static(b"nope"),
        }.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    }
}
