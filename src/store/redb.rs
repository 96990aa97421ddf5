//! redb-backed implementation of [`MappingStore`]
//!
//! Records are stored JSON-serialized in an embedded B-tree. redb serializes
//! write transactions, which is what makes the check-and-insert and the click
//! increment atomic without any service-side locking.

use async_trait::async_trait;
use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::error::StoreError;
use crate::model::{Scope, UrlMapping};
use crate::store::MappingStore;

/// Main table. Key: short id. Value: JSON-serialized `UrlMapping`.
const TABLE_MAPPINGS: TableDefinition<&str, &str> = TableDefinition::new("mappings_v1");

/// Secondary index. Key: record id. Value: short id.
///
/// Deletion and display-URL updates are keyed by record id, so this avoids a
/// scan on those paths.
const TABLE_ID_INDEX: TableDefinition<&str, &str> = TableDefinition::new("id_index_v1");

pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Creates or opens the database file and ensures both tables exist.
    pub fn open(db_path: &str) -> Result<Self, StoreError> {
        let db = Database::create(db_path)?;

        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(TABLE_MAPPINGS)?;
            write_txn.open_table(TABLE_ID_INDEX)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    fn decode(value: &str) -> Result<UrlMapping, StoreError> {
        Ok(serde_json::from_str(value)?)
    }
}

#[async_trait]
impl MappingStore for RedbStore {
    async fn insert(&self, mapping: &UrlMapping) -> Result<(), StoreError> {
        let record_json = serde_json::to_string(mapping)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut mappings = write_txn.open_table(TABLE_MAPPINGS)?;
            let mut ids = write_txn.open_table(TABLE_ID_INDEX)?;

            // Check-and-insert inside one write transaction. A live record
            // keeps its slot; an expired one may be replaced in place.
            let existing = match mappings.get(mapping.short_id.as_str())? {
                Some(guard) => Some(Self::decode(guard.value())?),
                None => None,
            };
            if let Some(old) = existing {
                if !old.is_expired(Utc::now()) {
                    return Err(StoreError::DuplicateId(mapping.short_id.clone()));
                }
                ids.remove(old.id.as_str())?;
            }

            mappings.insert(mapping.short_id.as_str(), record_json.as_str())?;
            ids.insert(mapping.id.as_str(), mapping.short_id.as_str())?;
        }
        write_txn.commit()?;

        Ok(())
    }

    async fn find_by_short_id(&self, short_id: &str) -> Result<Option<UrlMapping>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let mappings = read_txn.open_table(TABLE_MAPPINGS)?;

        let Some(guard) = mappings.get(short_id)? else {
            return Ok(None);
        };

        let mapping = Self::decode(guard.value())?;
        if mapping.is_expired(Utc::now()) {
            return Ok(None);
        }
        Ok(Some(mapping))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UrlMapping>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let ids = read_txn.open_table(TABLE_ID_INDEX)?;

        let short_id = match ids.get(id)? {
            Some(guard) => guard.value().to_string(),
            None => return Ok(None),
        };

        let mappings = read_txn.open_table(TABLE_MAPPINGS)?;
        let Some(guard) = mappings.get(short_id.as_str())? else {
            return Ok(None);
        };

        let mapping = Self::decode(guard.value())?;
        if mapping.is_expired(Utc::now()) {
            return Ok(None);
        }
        Ok(Some(mapping))
    }

    async fn find_by_url(
        &self,
        original_url: &str,
        scope: &Scope,
    ) -> Result<Option<UrlMapping>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let mappings = read_txn.open_table(TABLE_MAPPINGS)?;
        let now = Utc::now();

        // Linear scan; the dedup check is one equality probe per create.
        for entry in mappings.iter()? {
            let (_, value) = entry?;
            let mapping = Self::decode(value.value())?;
            if mapping.is_expired(now) {
                continue;
            }
            if mapping.original_url == original_url && scope.matches(mapping.owner.as_deref()) {
                return Ok(Some(mapping));
            }
        }
        Ok(None)
    }

    async fn list(&self, scope: &Scope) -> Result<Vec<UrlMapping>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let mappings = read_txn.open_table(TABLE_MAPPINGS)?;
        let now = Utc::now();

        let mut results = Vec::new();
        for entry in mappings.iter()? {
            let (_, value) = entry?;
            let mapping = Self::decode(value.value())?;
            if !mapping.is_expired(now) && scope.matches(mapping.owner.as_deref()) {
                results.push(mapping);
            }
        }

        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }

    async fn increment_clicks(&self, short_id: &str) -> Result<Option<UrlMapping>, StoreError> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut mappings = write_txn.open_table(TABLE_MAPPINGS)?;

            let current = match mappings.get(short_id)? {
                Some(guard) => Some(Self::decode(guard.value())?),
                None => None,
            };

            match current {
                Some(mut mapping) if !mapping.is_expired(Utc::now()) => {
                    mapping.clicks += 1;
                    let record_json = serde_json::to_string(&mapping)?;
                    mappings.insert(short_id, record_json.as_str())?;
                    Some(mapping)
                }
                _ => None,
            }
        };
        write_txn.commit()?;

        Ok(updated)
    }

    async fn update_short_url(&self, id: &str, short_url: &str) -> Result<bool, StoreError> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let ids = write_txn.open_table(TABLE_ID_INDEX)?;
            let mut mappings = write_txn.open_table(TABLE_MAPPINGS)?;

            let short_id = match ids.get(id)? {
                Some(guard) => guard.value().to_string(),
                None => return Ok(false),
            };

            let current = match mappings.get(short_id.as_str())? {
                Some(guard) => Some(Self::decode(guard.value())?),
                None => None,
            };

            match current {
                Some(mut mapping) if !mapping.is_expired(Utc::now()) => {
                    mapping.short_url = short_url.to_string();
                    let record_json = serde_json::to_string(&mapping)?;
                    mappings.insert(short_id.as_str(), record_json.as_str())?;
                    true
                }
                _ => false,
            }
        };
        write_txn.commit()?;

        Ok(updated)
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool, StoreError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut ids = write_txn.open_table(TABLE_ID_INDEX)?;
            let mut mappings = write_txn.open_table(TABLE_MAPPINGS)?;

            let result = match ids.remove(id)? {
                Some(guard) => {
                    let short_id = guard.value().to_string();
                    drop(guard);
                    mappings.remove(short_id.as_str())?.is_some()
                }
                None => false,
            };
            result
        };
        write_txn.commit()?;

        Ok(removed)
    }

    async fn purge_expired(&self) -> Result<usize, StoreError> {
        let write_txn = self.db.begin_write()?;
        let purged = {
            let mut mappings = write_txn.open_table(TABLE_MAPPINGS)?;
            let mut ids = write_txn.open_table(TABLE_ID_INDEX)?;
            let now = Utc::now();

            let mut expired: Vec<(String, String)> = Vec::new();
            for entry in mappings.iter()? {
                let (key, value) = entry?;
                let mapping = Self::decode(value.value())?;
                if mapping.is_expired(now) {
                    expired.push((key.value().to_string(), mapping.id));
                }
            }

            for (short_id, id) in &expired {
                mappings.remove(short_id.as_str())?;
                ids.remove(id.as_str())?;
            }
            expired.len()
        };
        write_txn.commit()?;

        Ok(purged)
    }
}
