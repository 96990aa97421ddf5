//! Access boundary
//!
//! Session issuance lives outside this service. A caller proves identity with
//! an `Authorization: Bearer` header, and the token value travels through as
//! the opaque owner identifier attached to mappings. Requests without a
//! usable token proceed anonymously; the private route variants reject them.

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Opaque identity of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

fn bearer_identity(headers: &HeaderMap) -> Option<OwnerId> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(OwnerId(token.to_string()))
    }
}

/// Attaches the caller's identity to the request when a bearer token is
/// present.
pub async fn identify(mut request: Request, next: Next) -> Response {
    if let Some(owner) = bearer_identity(request.headers()) {
        request.extensions_mut().insert(owner);
    }
    next.run(request).await
}

/// Rejects requests that did not resolve to an identity. Layered inside
/// [`identify`] on the private route variants.
pub async fn require_identity(request: Request, next: Next) -> Result<Response, Response> {
    if request.extensions().get::<OwnerId>().is_none() {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "success": false,
                "message": "Not authorized, no token",
            })),
        )
            .into_response());
    }
    Ok(next.run(request).await)
}
