use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use tracing::instrument;
use url::Url;

use super::{join_segments, Blob, StoreError};

/// Object storage for part and ticket images, addressed by object path
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn exists(&self, path: &str) -> Result<bool, StoreError>;

    async fn fetch(&self, path: &str) -> Result<Option<Blob>, StoreError>;

    async fn upload(&self, path: &str, blob: Blob) -> Result<(), StoreError>;

    /// Removes `path`; a missing object is not an error
    async fn delete(&self, path: &str) -> Result<(), StoreError>;

    /// Public download URL of `path`
    fn public_url(&self, path: &str) -> String;
}

#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    objects: DashMap<String, Blob>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self.objects.contains_key(path))
    }

    async fn fetch(&self, path: &str) -> Result<Option<Blob>, StoreError> {
        Ok(self.objects.get(path).map(|entry| entry.value().clone()))
    }

    async fn upload(&self, path: &str, blob: Blob) -> Result<(), StoreError> {
        self.objects.insert(path.to_string(), blob);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.objects.remove(path);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://{}", path)
    }
}

/// Firebase Storage bucket accessed through the JSON object API
#[derive(Debug, Clone)]
pub struct FirebaseBlobStore {
    client: Client,
    api_url: Url,
    bucket: String,
    auth_token: Option<String>,
}

impl FirebaseBlobStore {
    pub fn new(
        api_url: impl AsRef<str>,
        bucket: impl Into<String>,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: Url::parse(api_url.as_ref())?,
            bucket: bucket.into(),
            auth_token,
        })
    }

    /// The whole object path is one segment, so `/` travels as `%2F`
    fn object_url(&self, path: &str) -> Result<Url, StoreError> {
        join_segments(&self.api_url, ["b", self.bucket.as_str(), "o", path])
    }

    fn status_error(status: StatusCode, path: &str) -> StoreError {
        StoreError::Status {
            status: status.as_u16(),
            path: path.to_string(),
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl BlobStore for FirebaseBlobStore {
    #[instrument(skip(self))]
    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        let response = self
            .authorized(self.client.get(self.object_url(path)?))
            .send()
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(Self::status_error(status, path)),
        }
    }

    #[instrument(skip(self))]
    async fn fetch(&self, path: &str) -> Result<Option<Blob>, StoreError> {
        let response = self
            .authorized(self.client.get(self.object_url(path)?))
            .query(&[("alt", "media")])
            .send()
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let content_type = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data: Bytes = response.bytes().await?;
                Ok(Some(Blob { content_type, data }))
            }
            status => Err(Self::status_error(status, path)),
        }
    }

    #[instrument(skip(self, blob), fields(size = blob.data.len()))]
    async fn upload(&self, path: &str, blob: Blob) -> Result<(), StoreError> {
        let url = join_segments(&self.api_url, ["b", self.bucket.as_str(), "o"])?;
        let response = self
            .authorized(self.client.post(url))
            .query(&[("uploadType", "media"), ("name", path)])
            .header(CONTENT_TYPE, blob.content_type)
            .body(blob.data)
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::status_error(response.status(), path))
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let response = self
            .authorized(self.client.delete(self.object_url(path)?))
            .send()
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            status => Err(Self::status_error(status, path)),
        }
    }

    fn public_url(&self, path: &str) -> String {
        match self.object_url(path) {
            Ok(mut url) => {
                url.set_query(Some("alt=media"));
                url.to_string()
            }
            Err(_) => format!("{}?alt=media", self.api_url),
        }
    }
}
