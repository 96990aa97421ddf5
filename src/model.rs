//! Data model for the URL shortener
//!
//! Defines the persisted mapping record, the ownership scope used for
//! duplicate-URL queries, and the request payloads accepted by the API.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mappings are purged this long after creation.
pub const RETENTION_DAYS: i64 = 365;

/// A persisted association between an original URL and a short identifier.
///
/// Serialized as camelCase JSON, which is both the storage format and the
/// wire format consumed by the frontend.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UrlMapping {
    /// Opaque record identifier. Deletion is keyed by this, not the short id.
    pub id: String,

    /// The original long URL that was shortened.
    pub original_url: String,

    /// Short identifier, unique across the whole store.
    pub short_id: String,

    /// Display URL, `<frontend base>/<short_id>`. Recomputed when the caller
    /// supplies a different base; never used as a lookup key.
    pub short_url: String,

    /// Owning identity. `None` means the mapping is public. Immutable once set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Creation time, the anchor for the retention window.
    pub created_at: DateTime<Utc>,

    /// Number of successful resolutions of this short id.
    #[serde(default)]
    pub clicks: u64,
}

impl UrlMapping {
    /// Builds a fresh mapping with a random record id and zero clicks.
    pub fn new(
        original_url: String,
        short_id: String,
        short_url: String,
        owner: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            original_url,
            short_id,
            short_url,
            owner,
            created_at: Utc::now(),
            clicks: 0,
        }
    }

    /// Whether the retention window has elapsed. Expired records are treated
    /// as absent by every read path before the sweeper physically removes them.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > Duration::days(RETENTION_DAYS)
    }
}

/// Ownership context for duplicate-URL checks and listing.
///
/// Public and owned mappings live in disjoint scopes: the same original URL
/// may be shortened once per scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Mappings without an owner.
    Public,
    /// Mappings belonging to one authenticated identity.
    Owned(String),
}

impl Scope {
    pub fn from_owner(owner: Option<String>) -> Self {
        match owner {
            Some(id) => Scope::Owned(id),
            None => Scope::Public,
        }
    }

    /// Whether a record's owner field falls inside this scope.
    pub fn matches(&self, owner: Option<&str>) -> bool {
        match self {
            Scope::Public => owner.is_none(),
            Scope::Owned(id) => owner == Some(id.as_str()),
        }
    }
}

/// Request payload for creating a short URL.
///
/// ```json
/// {
///   "originalUrl": "https://example.com/very/long/url",
///   "frontendUrl": "https://short.ly"
/// }
/// ```
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    /// The URL to shorten. Validated by the service, not by deserialization,
    /// so an absent field reports a clean error instead of a body rejection.
    #[serde(default)]
    pub original_url: String,

    /// Base used to build the display URL.
    #[serde(default)]
    pub frontend_url: String,
}

/// Query parameters for listing URLs.
///
/// Query string: `?frontendUrl=https://short.ly`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// When present, every returned mapping's display URL is rebased onto
    /// this value (and persisted if it actually changed).
    pub frontend_url: Option<String>,
}
