use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use super::{join_segments, DocumentStore, PushIdGenerator, StoreError};

/// Firebase Realtime Database accessed through its REST interface.
///
/// Every path maps to `{database_url}/{path}.json`. A `null` body means the
/// path is empty.
#[derive(Debug, Clone)]
pub struct FirebaseStore {
    client: Client,
    database_url: Url,
    auth_token: Option<String>,
    ids: std::sync::Arc<PushIdGenerator>,
}

impl FirebaseStore {
    pub fn new(
        database_url: impl AsRef<str>,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).gzip(true).build()?;
        Ok(Self {
            client,
            database_url: Url::parse(database_url.as_ref())?,
            auth_token,
            ids: std::sync::Arc::new(PushIdGenerator::new()),
        })
    }

    /// Each key is percent-encoded as its own path segment
    fn url(&self, path: &str) -> Result<Url, StoreError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((last, parents)) = segments.split_last() else {
            return Err(StoreError::InvalidPath(path.to_string()));
        };
        let leaf = format!("{last}.json");
        join_segments(
            &self.database_url,
            parents.iter().copied().chain(std::iter::once(leaf.as_str())),
        )
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.query(&[("auth", token.as_str())]),
            None => request,
        }
    }

    fn check(status: StatusCode, path: &str) -> Result<(), StoreError> {
        if status.is_success() {
            Ok(())
        } else {
            Err(StoreError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            })
        }
    }
}

#[async_trait]
impl DocumentStore for FirebaseStore {
    #[instrument(skip(self))]
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let response = self
            .with_auth(self.client.get(self.url(path)?))
            .send()
            .await?;
        Self::check(response.status(), path)?;

        let value: Value = response.json().await?;
        debug!(found = !value.is_null(), "store read");
        Ok(if value.is_null() { None } else { Some(value) })
    }

    #[instrument(skip(self, value))]
    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let response = self
            .with_auth(self.client.put(self.url(path)?))
            .json(&value)
            .send()
            .await?;
        Self::check(response.status(), path)
    }

    #[instrument(skip(self))]
    async fn child_keys(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let response = self
            .with_auth(self.client.get(self.url(path)?))
            .query(&[("shallow", "true")])
            .send()
            .await?;
        Self::check(response.status(), path)?;

        let value: Value = response.json().await?;
        Ok(value
            .as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn generate_key(&self, _collection: &str) -> String {
        self.ids.next_id()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let response = self
            .with_auth(self.client.get(self.url(".info/connected")?))
            .send()
            .await?;
        Self::check(response.status(), ".info/connected")
    }
}
