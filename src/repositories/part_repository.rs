use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::debug;

use super::{BaseRepository, Repository};
use crate::cache::InMemoryCache;
use crate::catalog::PartMap;
use crate::models::{PartAdminUpdate, PartRecord};
use crate::store::{key_path, DocumentStore, StoreError, PARTS_COLLECTION};

/// Repository for part records under `parts-collection`
#[derive(Debug)]
pub struct PartRepository {
    base: BaseRepository,
    snapshot: InMemoryCache<&'static str, PartMap>,
}

impl PartRepository {
    pub fn new(store: Arc<dyn DocumentStore>, ttl: Option<Duration>) -> Self {
        Self {
            base: BaseRepository::new(store),
            snapshot: InMemoryCache::new(ttl),
        }
    }

    /// The whole part mapping, served from the snapshot cache when fresh
    pub async fn all(&self) -> Result<Arc<PartMap>, StoreError> {
        if let Some(parts) = self.snapshot.get(&PARTS_COLLECTION).await {
            return Ok(parts);
        }

        let generation = self.snapshot.generation();
        let raw = self.store().get(PARTS_COLLECTION).await?;
        let parts: PartMap = match raw {
            Some(Value::Object(records)) => records
                .iter()
                .map(|(code, record)| (code.clone(), PartRecord::from_raw(code, record)))
                .collect(),
            _ => PartMap::new(),
        };
        debug!(count = parts.len(), "Loaded part snapshot");
        Ok(self
            .snapshot
            .set_if_current(PARTS_COLLECTION, parts, generation)
            .await)
    }

    /// One part by code. Reads a single record unless a snapshot is cached.
    pub async fn find(&self, code: &str) -> Result<Option<PartRecord>, StoreError> {
        if let Some(parts) = self.snapshot.get(&PARTS_COLLECTION).await {
            return Ok(parts.get(code).cloned());
        }
        Ok(self
            .find_raw(code)
            .await?
            .map(|raw| PartRecord::from_raw(code, &Value::Object(raw))))
    }

    async fn find_raw(&self, code: &str) -> Result<Option<Map<String, Value>>, StoreError> {
        let Ok(path) = key_path(&[PARTS_COLLECTION, code]) else {
            return Ok(None);
        };
        match self.store().get(&path).await? {
            Some(Value::Object(raw)) => Ok(Some(raw)),
            _ => Ok(None),
        }
    }

    /// Read-modify-write of the admin fields; `None` when the part does not exist.
    /// No locking: the last concurrent writer wins.
    pub async fn merge_admin(
        &self,
        code: &str,
        update: &PartAdminUpdate,
    ) -> Result<Option<PartRecord>, StoreError> {
        let Some(mut raw) = self.find_raw(code).await? else {
            return Ok(None);
        };
        update.merge_into(code, &mut raw);

        let path = key_path(&[PARTS_COLLECTION, code])?;
        let merged = Value::Object(raw);
        self.store().set(&path, merged.clone()).await?;
        self.invalidate().await;

        Ok(Some(PartRecord::from_raw(code, &merged)))
    }

    pub async fn invalidate(&self) {
        self.snapshot.clear().await;
    }
}

impl Repository for PartRepository {
    fn store(&self) -> &dyn DocumentStore {
        self.base.store()
    }
}
