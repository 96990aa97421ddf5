//! Route definitions
//!
//! Every authenticated operation exists in two forms: a public route that
//! attaches an identity when one is offered, and a private route that demands
//! one. Both run the same handlers.

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::auth::{identify, require_identity};
use crate::handler::{
    create_short_url, delete_short_url, landing, list_urls, resolve_short_url,
};
use crate::service::MappingService;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: MappingService,
}

/// Creates the Axum application router.
///
/// # Route Definitions
///
/// - `GET /` - landing banner
/// - `POST /api/urls/shorten` - create a short URL (identity optional)
/// - `GET /api/urls` - list the caller's scope (identity optional)
/// - `GET /api/urls/{shortId}` - resolve a short id, counting the visit
/// - `DELETE /api/urls/{id}` - delete by record id (identity optional)
/// - `POST /api/urls/shorten/private` - create, identity required
/// - `GET /api/urls/user/urls` - list, identity required
/// - `DELETE /api/urls/user/{id}` - delete, identity required
pub fn create_app(state: AppState) -> Router {
    // Routes gated on a valid identity. `identify` is layered outermost
    // below, so the extension is in place by the time the gate runs.
    let private_routes = Router::new()
        .route("/shorten/private", post(create_short_url))
        .route("/user/urls", get(list_urls))
        .route("/user/{id}", delete(delete_short_url))
        .layer(middleware::from_fn(require_identity));

    let url_routes = Router::new()
        .route("/shorten", post(create_short_url))
        .route("/", get(list_urls))
        .route("/{id}", get(resolve_short_url).delete(delete_short_url))
        .merge(private_routes)
        .layer(middleware::from_fn(identify));

    Router::new()
        .route("/", get(landing))
        .nest("/api/urls", url_routes)
        .with_state(state)
}
