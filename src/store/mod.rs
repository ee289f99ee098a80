//! Data access layer over the remote hierarchical document store and the blob store.
//!
//! Records are addressed by slash-separated key paths (`parts-collection/{code}`).
//! Both stores are external collaborators: the traits here describe the exact
//! request/response contract the rest of the crate relies on, and the backends
//! (`memory`, `firebase`) implement it.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Map, Value};
use thiserror::Error;

pub mod blob;
pub mod firebase;
pub mod memory;
pub mod push_id;

pub use blob::{BlobStore, FirebaseBlobStore, InMemoryBlobStore};
#[cfg(test)]
pub use blob::MockBlobStore;
pub use firebase::FirebaseStore;
pub use memory::InMemoryStore;
pub use push_id::PushIdGenerator;

pub const PARTS_COLLECTION: &str = "parts-collection";
pub const BOM_COLLECTION: &str = "bom-collection";
pub const APPLICATIONS_COLLECTION: &str = "applications-collection";
pub const APPLICATION_IMAGES_PREFIX: &str = "applications";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected status {status} for {path}")]
    Status { status: u16, path: String },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid key path: {0}")]
    InvalidPath(String),
    #[error("Invalid store URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Read/write access to a JSON document tree addressed by key path.
///
/// There are no transactions: a single `set` replaces the value at one path
/// and is the unit of atomicity readers can rely on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Value at `path`, `None` when nothing is stored there
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the value at `path`. Server value placeholders are resolved by the store.
    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Immediate child keys of `path`, without their values
    async fn child_keys(&self, path: &str) -> Result<Vec<String>, StoreError>;

    /// New unique, chronologically ordered child key for `collection`
    fn generate_key(&self, collection: &str) -> String;

    /// Connectivity check used by readiness endpoints
    async fn ping(&self) -> Result<(), StoreError>;
}

impl std::fmt::Debug for dyn DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DocumentStore")
    }
}

impl std::fmt::Debug for dyn BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BlobStore")
    }
}

/// Server-side timestamp placeholder, resolved to epoch milliseconds on write
pub fn server_timestamp() -> Value {
    let mut sv = Map::new();
    sv.insert(".sv".to_string(), Value::String("timestamp".to_string()));
    Value::Object(sv)
}

pub fn is_server_timestamp(value: &Value) -> bool {
    value
        .as_object()
        .filter(|obj| obj.len() == 1)
        .and_then(|obj| obj.get(".sv"))
        .and_then(Value::as_str)
        == Some("timestamp")
}

/// Join path segments, rejecting segments the store cannot address
pub fn key_path(segments: &[&str]) -> Result<String, StoreError> {
    for segment in segments {
        validate_key(segment)?;
    }
    Ok(segments.join("/"))
}

/// Keys may not be empty or contain `.`, `$`, `#`, `[`, `]` or `/`
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    const FORBIDDEN: [char; 6] = ['.', '$', '#', '[', ']', '/'];
    if key.trim().is_empty() || key.chars().any(|c| FORBIDDEN.contains(&c) || c.is_control()) {
        return Err(StoreError::InvalidPath(key.to_string()));
    }
    Ok(())
}

/// `base` with `segments` appended, each percent-encoded as a single segment
pub(crate) fn join_segments<'a>(
    base: &url::Url,
    segments: impl IntoIterator<Item = &'a str>,
) -> Result<url::Url, StoreError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| StoreError::InvalidPath(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Blob payload with its content type
#[derive(Debug, Clone)]
pub struct Blob {
    pub content_type: String,
    pub data: Bytes,
}
