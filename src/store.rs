//! Mapping persistence
//!
//! [`MappingStore`] is the storage capability the service is handed at
//! construction time. It is deliberately narrow: equality lookups, a
//! uniqueness-enforcing insert, an atomic click increment, and retention
//! bookkeeping. The redb-backed implementation lives in the `redb` submodule.

pub mod redb;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::MissedTickBehavior;

use crate::error::StoreError;
use crate::model::{Scope, UrlMapping};

pub use self::redb::RedbStore;

/// How often the background sweeper reclaims expired records.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Durable collection of URL mappings, keyed by short id.
///
/// Implementations must provide their own concurrency control: the insert is
/// an atomic check-and-put on the short id, and the click increment is an
/// atomic read-modify-write. Records past the retention window behave as
/// absent on every read, whether or not the sweeper has removed them yet, so
/// callers must tolerate a record disappearing between a read and a later
/// write.
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// Inserts a new mapping. Fails with [`StoreError::DuplicateId`] when the
    /// short id is already taken by a live record.
    async fn insert(&self, mapping: &UrlMapping) -> Result<(), StoreError>;

    /// Equality lookup by short id.
    async fn find_by_short_id(&self, short_id: &str) -> Result<Option<UrlMapping>, StoreError>;

    /// Equality lookup by record id.
    async fn find_by_id(&self, id: &str) -> Result<Option<UrlMapping>, StoreError>;

    /// Equality lookup by original URL within one ownership scope.
    async fn find_by_url(
        &self,
        original_url: &str,
        scope: &Scope,
    ) -> Result<Option<UrlMapping>, StoreError>;

    /// All mappings in a scope, newest first.
    async fn list(&self, scope: &Scope) -> Result<Vec<UrlMapping>, StoreError>;

    /// Atomically adds one click to the mapping with this short id and
    /// returns the updated record, or `None` when no live record exists.
    async fn increment_clicks(&self, short_id: &str) -> Result<Option<UrlMapping>, StoreError>;

    /// Persists a recomputed display URL. Returns `false` when the record is
    /// gone.
    async fn update_short_url(&self, id: &str, short_url: &str) -> Result<bool, StoreError>;

    /// Removes the mapping with this record id. Returns `false` when absent.
    async fn delete_by_id(&self, id: &str) -> Result<bool, StoreError>;

    /// Physically removes records past the retention window. Returns how many
    /// were purged.
    async fn purge_expired(&self) -> Result<usize, StoreError>;
}

/// Periodically purges expired mappings. Spawned once at startup; runs for
/// the life of the process.
pub async fn run_expiry_sweeper(store: Arc<dyn MappingStore>) {
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match store.purge_expired().await {
            Ok(0) => {}
            Ok(purged) => tracing::info!(purged, "expired mappings removed"),
            Err(e) => tracing::warn!(error = %e, "expiry sweep failed"),
        }
    }
}
