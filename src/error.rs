//! Error taxonomy and HTTP mapping
//!
//! Store faults are translated into [`StoreError`] at the storage boundary;
//! nothing from redb or serde crosses into the service layer raw. The
//! service-level [`ServiceError`] maps onto the API's response envelope, so a
//! handler can bail with `?` anywhere and still produce the documented JSON.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Faults raised by a [`crate::store::MappingStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An insert would collide with an existing short id.
    #[error("short id already taken: {0}")]
    DuplicateId(String),

    /// The backing engine failed (I/O, transaction, commit).
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored record could not be decoded.
    #[error("corrupted record: {0}")]
    Corrupted(String),
}

impl From<redb::DatabaseError> for StoreError {
    fn from(e: redb::DatabaseError) -> Self {
        StoreError::Backend(e.to_string())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(e: redb::TransactionError) -> Self {
        StoreError::Backend(e.to_string())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(e: redb::TableError) -> Self {
        StoreError::Backend(e.to_string())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(e: redb::StorageError) -> Self {
        StoreError::Backend(e.to_string())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(e: redb::CommitError) -> Self {
        StoreError::Backend(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Corrupted(e.to_string())
    }
}

/// Failures surfaced by the mapping service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A required field was missing or empty.
    #[error("{0} is required")]
    InvalidInput(&'static str),

    /// No mapping for the given short id or record id.
    #[error("URL not found")]
    NotFound,

    /// Caller identity does not match the record owner.
    #[error("Not authorized to delete this URL")]
    Unauthorized,

    /// Every generated short id collided. With 62^6 candidates this means
    /// something is wrong with the store, not with the dice.
    #[error("could not allocate a unique short id")]
    GenerationExhausted,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    fn status(&self) -> StatusCode {
        match self {
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServiceError::GenerationExhausted | ServiceError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            json!({
                "success": false,
                "message": "Server Error",
                "error": self.to_string(),
            })
        } else {
            json!({
                "success": false,
                "message": self.to_string(),
            })
        };

        (status, Json(body)).into_response()
    }
}
