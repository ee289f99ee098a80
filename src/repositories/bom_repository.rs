use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use super::{BaseRepository, Repository};
use crate::cache::InMemoryCache;
use crate::models::BomComponent;
use crate::store::{key_path, DocumentStore, StoreError, BOM_COLLECTION};

/// Repository for BoM components under `bom-collection/{model}`
#[derive(Debug)]
pub struct BomRepository {
    base: BaseRepository,
    components: InMemoryCache<String, Vec<BomComponent>>,
}

impl BomRepository {
    pub fn new(store: Arc<dyn DocumentStore>, ttl: Option<Duration>) -> Self {
        Self {
            base: BaseRepository::new(store),
            components: InMemoryCache::new(ttl),
        }
    }

    /// Model+year keys, sorted
    pub async fn models(&self) -> Result<Vec<String>, StoreError> {
        let mut models = self.store().child_keys(BOM_COLLECTION).await?;
        models.sort();
        Ok(models)
    }

    /// Components of one model sorted by component code; `None` for an unknown model
    pub async fn components(
        &self,
        model: &str,
    ) -> Result<Option<Arc<Vec<BomComponent>>>, StoreError> {
        if let Some(cached) = self.components.get(&model.to_string()).await {
            return Ok(Some(cached));
        }
        let Ok(path) = key_path(&[BOM_COLLECTION, model]) else {
            return Ok(None);
        };
        let generation = self.components.generation();
        let Some(Value::Object(raw)) = self.store().get(&path).await? else {
            return Ok(None);
        };

        let mut components: Vec<BomComponent> = raw
            .iter()
            .map(|(code, record)| BomComponent::from_raw(model, code, record))
            .collect();
        components.sort_by(|a, b| a.component_code.cmp(&b.component_code));
        Ok(Some(
            self.components
                .set_if_current(model.to_string(), components, generation)
                .await,
        ))
    }

    pub async fn invalidate(&self) {
        self.components.clear().await;
    }
}

impl Repository for BomRepository {
    fn store(&self) -> &dyn DocumentStore {
        self.base.store()
    }
}
