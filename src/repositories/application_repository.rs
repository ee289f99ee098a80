use std::sync::Arc;

use serde_json::Value;

use super::{BaseRepository, Repository};
use crate::models::PartApplication;
use crate::store::{key_path, DocumentStore, StoreError, APPLICATIONS_COLLECTION};

/// Repository for tickets under `applications-collection`.
/// Tickets are written once and never updated or deleted here.
#[derive(Debug)]
pub struct ApplicationRepository {
    base: BaseRepository,
}

impl ApplicationRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            base: BaseRepository::new(store),
        }
    }

    /// Fresh ticket id from the store's own key generator
    pub fn next_id(&self) -> String {
        self.store().generate_key(APPLICATIONS_COLLECTION)
    }

    /// Persist a complete ticket record in a single write
    pub async fn insert(&self, id: &str, record: Value) -> Result<(), StoreError> {
        let path = key_path(&[APPLICATIONS_COLLECTION, id])?;
        self.store().set(&path, record).await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<PartApplication>, StoreError> {
        let Ok(path) = key_path(&[APPLICATIONS_COLLECTION, id]) else {
            return Ok(None);
        };
        Ok(self
            .store()
            .get(&path)
            .await?
            .filter(Value::is_object)
            .map(|raw| PartApplication::from_raw(id, &raw)))
    }

    /// Every ticket, most recently created first
    pub async fn find_all(&self) -> Result<Vec<PartApplication>, StoreError> {
        let mut tickets: Vec<PartApplication> = match self.store().get(APPLICATIONS_COLLECTION).await? {
            Some(Value::Object(records)) => records
                .iter()
                .filter(|(_, raw)| raw.is_object())
                .map(|(id, raw)| PartApplication::from_raw(id, raw))
                .collect(),
            _ => Vec::new(),
        };
        // push ids are chronological, so they break timestamp ties
        tickets.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(tickets)
    }
}

impl Repository for ApplicationRepository {
    fn store(&self) -> &dyn DocumentStore {
        self.base.store()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn find_all_is_newest_first() {
        let store = InMemoryStore::with_data(json!({
            "applications-collection": {
                "a": {"requester": "A", "department": "D", "createdAt": 1_000},
                "b": {"requester": "B", "department": "D", "createdAt": 3_000},
                "c": {"requester": "C", "department": "D", "createdAt": 2_000},
                "junk": "not a ticket"
            }
        }));
        let repo = ApplicationRepository::new(Arc::new(store));
        let ids: Vec<String> = repo
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn insert_then_find_by_id() {
        let repo = ApplicationRepository::new(Arc::new(InMemoryStore::new()));
        let id = repo.next_id();
        repo.insert(&id, json!({"requester": "Alice", "department": "Eng"}))
            .await
            .unwrap();

        let ticket = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(ticket.requester, "Alice");
        assert!(repo.find_by_id("missing").await.unwrap().is_none());
        assert!(repo.find_by_id("a/b").await.unwrap().is_none());
    }
}
