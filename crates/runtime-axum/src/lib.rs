
#[allow(unused)]
#[macro_use]
extern crate tracing;

use axum::extract;
use std::sync::Arc;

pub mod layers;
pub mod server;


/// Router state: a shared application value, dereferencing to it.
pub struct ServerState<T> {
    pub app: Arc<T>,
}
impl<T> Clone for ServerState<T> {
    fn clone(&self) -> Self {
        ServerState {
            app: Arc::clone(&self.app),
        }
    }
}
impl<T> std::ops::Deref for ServerState<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.app
    }
}
impl<T> ServerState<T> {
    pub fn new(app: Arc<T>) -> Self {
        Self { app }
    }
}

/// The credential from an `Authorization: Bearer ...` header, if any.
pub struct ExtractBearer(pub Option<String>);

#[axum::async_trait]
impl<S> extract::FromRequestParts<S> for ExtractBearer where S: Send + Sync {
    type Rejection = std::convert::Infallible;
    async fn from_request_parts(parts: &mut axum::http::request::Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts.headers.get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token);
        Ok(ExtractBearer(token))
    }
}

/// The credential of a `Bearer` authorization value. The scheme name is
/// case-insensitive.
pub fn bearer_token(value: &str) -> Option<String> {
    let (scheme, token) = value.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_owned())
}
