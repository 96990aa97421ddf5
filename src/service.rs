//! Mapping service
//!
//! Orchestrates create, list, resolve and delete on top of an injected
//! [`MappingStore`], enforcing the ownership and uniqueness rules. This is
//! the only layer with business decisions; handlers translate HTTP and the
//! store moves bytes.

use std::sync::Arc;

use crate::error::{ServiceError, StoreError};
use crate::generator;
use crate::model::{Scope, UrlMapping};
use crate::store::MappingStore;

/// Insert attempts before giving up on finding a free short id.
const MAX_ID_ATTEMPTS: usize = 5;

/// Result of a create call: either a freshly inserted mapping or the
/// already-existing one for the same URL and scope.
#[derive(Debug)]
pub struct CreateOutcome {
    pub created: bool,
    pub mapping: UrlMapping,
}

#[derive(Clone)]
pub struct MappingService {
    store: Arc<dyn MappingStore>,
}

impl MappingService {
    pub fn new(store: Arc<dyn MappingStore>) -> Self {
        Self { store }
    }

    /// Shortens a URL, deduplicating within the caller's scope.
    ///
    /// The same original URL shortened twice in one scope returns the first
    /// mapping with `created: false`. Different scopes get independent
    /// mappings. On a short id collision the id is regenerated a bounded
    /// number of times; the colliding record is never overwritten.
    pub async fn create(
        &self,
        original_url: &str,
        frontend_url: &str,
        owner: Option<String>,
    ) -> Result<CreateOutcome, ServiceError> {
        if original_url.trim().is_empty() {
            return Err(ServiceError::InvalidInput("originalUrl"));
        }

        let scope = Scope::from_owner(owner.clone());
        if let Some(existing) = self.store.find_by_url(original_url, &scope).await? {
            return Ok(CreateOutcome {
                created: false,
                mapping: existing,
            });
        }

        for _ in 0..MAX_ID_ATTEMPTS {
            let short_id = generator::short_id();
            let short_url = format!("{}/{}", frontend_url, short_id);
            let mapping = UrlMapping::new(
                original_url.to_string(),
                short_id,
                short_url,
                owner.clone(),
            );

            match self.store.insert(&mapping).await {
                Ok(()) => {
                    tracing::debug!(short_id = %mapping.short_id, "mapping created");
                    return Ok(CreateOutcome {
                        created: true,
                        mapping,
                    });
                }
                Err(StoreError::DuplicateId(id)) => {
                    tracing::warn!(short_id = %id, "short id collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::GenerationExhausted)
    }

    /// Lists the caller's scope, newest first.
    ///
    /// With a `frontend_url`, each returned mapping's display URL is rebased
    /// onto it; the write is skipped when the value is already current, so
    /// repeated calls with the same base are read-only after the first.
    pub async fn list(
        &self,
        frontend_url: Option<&str>,
        owner: Option<String>,
    ) -> Result<Vec<UrlMapping>, ServiceError> {
        let scope = Scope::from_owner(owner);
        let mut mappings = self.store.list(&scope).await?;

        if let Some(base) = frontend_url {
            for mapping in &mut mappings {
                let rebased = format!("{}/{}", base, mapping.short_id);
                if mapping.short_url != rebased {
                    // A record that expired since the read just misses the
                    // persisted update; the returned copy is rebased anyway.
                    self.store.update_short_url(&mapping.id, &rebased).await?;
                    mapping.short_url = rebased;
                }
            }
        }

        Ok(mappings)
    }

    /// Resolves a short id, counting the visit.
    ///
    /// Lookup ignores ownership: short links resolve for everyone. The click
    /// increment happens atomically in the store, so concurrent resolves of
    /// the same id all land.
    pub async fn resolve(&self, short_id: &str) -> Result<UrlMapping, ServiceError> {
        match self.store.increment_clicks(short_id).await? {
            Some(mapping) => Ok(mapping),
            None => Err(ServiceError::NotFound),
        }
    }

    /// Deletes a mapping by record id.
    ///
    /// An authenticated caller may not delete another owner's record. An
    /// anonymous caller may delete anything, owned records included; see
    /// DESIGN.md for why that asymmetry is kept.
    pub async fn delete(&self, id: &str, caller: Option<String>) -> Result<(), ServiceError> {
        let Some(mapping) = self.store.find_by_id(id).await? else {
            return Err(ServiceError::NotFound);
        };

        if let (Some(record_owner), Some(caller)) = (&mapping.owner, &caller) {
            if record_owner != caller {
                return Err(ServiceError::Unauthorized);
            }
        }

        // Tolerate the record vanishing between the read and the delete.
        if !self.store.delete_by_id(id).await? {
            return Err(ServiceError::NotFound);
        }
        Ok(())
    }
}
