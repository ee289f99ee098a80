use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{is_server_timestamp, DocumentStore, PushIdGenerator, StoreError};

/// Document store holding the whole tree in process memory.
///
/// Used for local development and tests; it honours the same contract as the
/// remote backend, including server timestamp placeholders.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    root: RwLock<Map<String, Value>>,
    ids: PushIdGenerator,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with an initial document tree
    pub fn with_data(root: Value) -> Self {
        let root = match root {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            root: RwLock::new(root),
            ids: PushIdGenerator::new(),
        }
    }
}

fn segments(path: &str) -> Result<Vec<&str>, StoreError> {
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if parts.is_empty() {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(parts)
}

fn resolve_server_values(value: Value, now_millis: i64) -> Value {
    if is_server_timestamp(&value) {
        return Value::from(now_millis);
    }
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, resolve_server_values(v, now_millis)))
                .filter(|(_, v)| !v.is_null())
                .collect(),
        ),
        other => other,
    }
}

fn lookup<'a>(root: &'a Map<String, Value>, parts: &[&str]) -> Option<&'a Value> {
    let (first, rest) = parts.split_first()?;
    let mut current = root.get(*first)?;
    for part in rest {
        current = current.as_object()?.get(*part)?;
    }
    Some(current)
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let parts = segments(path)?;
        let root = self.root.read().await;
        Ok(lookup(&root, &parts).cloned())
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let parts = segments(path)?;
        let value = resolve_server_values(value, Utc::now().timestamp_millis());
        let mut root = self.root.write().await;

        let (last, parents) = match parts.split_last() {
            Some(split) => split,
            None => return Err(StoreError::InvalidPath(path.to_string())),
        };

        let mut current = &mut *root;
        for part in parents {
            let entry = current
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            current = match entry.as_object_mut() {
                Some(map) => map,
                None => return Err(StoreError::Backend(format!("{} is not a node", part))),
            };
        }

        if value.is_null() {
            current.remove(*last);
        } else {
            current.insert(last.to_string(), value);
        }
        Ok(())
    }

    async fn child_keys(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let parts = segments(path)?;
        let root = self.root.read().await;
        Ok(lookup(&root, &parts)
            .and_then(Value::as_object)
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn generate_key(&self, _collection: &str) -> String {
        self.ids.next_id()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::server_timestamp;
    use serde_json::json;

    #[tokio::test]
    async fn set_then_get_nested_paths() {
        let store = InMemoryStore::new();
        store
            .set("bom-collection/Civic 2020/C-1", json!({"description": "Bolt"}))
            .await
            .unwrap();

        let value = store.get("bom-collection/Civic 2020/C-1").await.unwrap();
        assert_eq!(value, Some(json!({"description": "Bolt"})));
        assert_eq!(
            store.child_keys("bom-collection").await.unwrap(),
            vec!["Civic 2020".to_string()]
        );
        assert!(store.get("bom-collection/Accord 2020").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn server_timestamp_is_resolved_on_write() {
        let store = InMemoryStore::new();
        let before = Utc::now().timestamp_millis();
        store
            .set("applications-collection/k1", json!({"createdAt": server_timestamp()}))
            .await
            .unwrap();

        let stored = store.get("applications-collection/k1").await.unwrap().unwrap();
        let created = stored["createdAt"].as_i64().unwrap();
        assert!(created >= before);
    }

    #[tokio::test]
    async fn setting_null_removes_the_node() {
        let store = InMemoryStore::with_data(json!({"parts-collection": {"A": {"x": 1}}}));
        store.set("parts-collection/A", Value::Null).await.unwrap();
        assert!(store.get("parts-collection/A").await.unwrap().is_none());
    }
}
