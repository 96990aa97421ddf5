//! HTTP request handlers
//!
//! Thin translation between the HTTP surface and the mapping service:
//! extract the payload and the optional identity, call the service, wrap the
//! outcome in the response envelope. Errors convert through
//! [`ServiceError`]'s `IntoResponse`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;

use crate::auth::OwnerId;
use crate::error::ServiceError;
use crate::model::{CreateRequest, ListParams};
use crate::route::AppState;

fn owner_string(owner: Option<Extension<OwnerId>>) -> Option<String> {
    owner.map(|Extension(id)| id.into_inner())
}

/// Creates a short URL, or returns the existing mapping for a URL the caller
/// already shortened in this scope.
///
/// - **201 Created** with the new mapping
/// - **200 OK** with `success: false` when the URL was already shortened
/// - **400 Bad Request** when `originalUrl` is missing
pub async fn create_short_url(
    State(state): State<AppState>,
    owner: Option<Extension<OwnerId>>,
    Json(payload): Json<CreateRequest>,
) -> Result<Response, ServiceError> {
    let outcome = state
        .service
        .create(
            &payload.original_url,
            &payload.frontend_url,
            owner_string(owner),
        )
        .await?;

    let response = if outcome.created {
        (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": "URL shortened successfully!",
                "url": outcome.mapping,
            })),
        )
    } else {
        (
            StatusCode::OK,
            Json(json!({
                "success": false,
                "message": "This URL is already shortened!",
                "url": outcome.mapping,
            })),
        )
    };

    Ok(response.into_response())
}

/// Lists the caller's mappings: the authenticated owner's when an identity is
/// attached, the public ones otherwise. `?frontendUrl=` rebases the display
/// URLs.
pub async fn list_urls(
    State(state): State<AppState>,
    owner: Option<Extension<OwnerId>>,
    Query(params): Query<ListParams>,
) -> Result<Response, ServiceError> {
    let urls = state
        .service
        .list(params.frontend_url.as_deref(), owner_string(owner))
        .await?;

    Ok(Json(json!({
        "success": true,
        "count": urls.len(),
        "urls": urls,
    }))
    .into_response())
}

/// Resolves a short id to its original URL, counting the visit. The frontend
/// performs the actual navigation.
pub async fn resolve_short_url(
    Path(short_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, ServiceError> {
    let mapping = state.service.resolve(&short_id).await?;

    Ok(Json(json!({
        "success": true,
        "originalUrl": mapping.original_url,
    }))
    .into_response())
}

/// Deletes a mapping by record id, rejecting owner mismatches for
/// authenticated callers.
pub async fn delete_short_url(
    Path(id): Path<String>,
    State(state): State<AppState>,
    owner: Option<Extension<OwnerId>>,
) -> Result<Response, ServiceError> {
    state.service.delete(&id, owner_string(owner)).await?;

    Ok(Json(json!({
        "success": true,
        "message": "URL deleted successfully!",
    }))
    .into_response())
}

/// Landing page.
pub async fn landing() -> &'static str {
    "URL shortener API is running..."
}
