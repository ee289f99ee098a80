use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::{cache::InMemoryCache, store::BlobStore};

/// Extensions tried for a part image, in order
pub const PART_IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "webp"];

/// Blob extension for an accepted image content type
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Resolves part codes to image URLs, falling back to a placeholder
#[derive(Debug)]
pub struct ImageService {
    blobs: Arc<dyn BlobStore>,
    resolved: InMemoryCache<String, String>,
    placeholder_url: String,
}

impl ImageService {
    pub fn new(blobs: Arc<dyn BlobStore>, placeholder_url: String, ttl: Option<Duration>) -> Self {
        Self {
            blobs,
            resolved: InMemoryCache::new(ttl),
            placeholder_url,
        }
    }

    /// First existing `{code}.png`, `{code}.jpg` or `{code}.webp`.
    /// Blob store failures count as absent.
    #[instrument(skip(self))]
    pub async fn resolve(&self, code: &str) -> String {
        if let Some(url) = self.resolved.get(&code.to_string()).await {
            return url.as_ref().clone();
        }

        let generation = self.resolved.generation();
        let mut url = self.placeholder_url.clone();
        for ext in PART_IMAGE_EXTENSIONS {
            let path = format!("{code}.{ext}");
            match self.blobs.exists(&path).await {
                Ok(true) => {
                    url = self.blobs.public_url(&path);
                    break;
                }
                Ok(false) => {}
                Err(e) => warn!(path = %path, "Image lookup failed: {}", e),
            }
        }
        debug!(code = %code, url = %url, "Resolved part image");
        self.resolved
            .set_if_current(code.to_string(), url, generation)
            .await
            .as_ref()
            .clone()
    }

    pub async fn invalidate(&self, code: &str) {
        self.resolved.invalidate(&code.to_string()).await;
    }

    pub async fn clear(&self) {
        self.resolved.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Blob, InMemoryBlobStore, MockBlobStore, StoreError};
    use bytes::Bytes;
    use test_case::test_case;

    #[test_case("image/png", Some("png"))]
    #[test_case("IMAGE/JPEG", Some("jpg"))]
    #[test_case("image/webp; charset=binary", Some("webp"))]
    #[test_case("image/gif", None)]
    fn maps_content_types(content_type: &str, expected: Option<&str>) {
        assert_eq!(image_extension(content_type), expected);
    }

    #[tokio::test]
    async fn png_wins_over_later_extensions() {
        let blobs = Arc::new(InMemoryBlobStore::new());
        for path in ["P-1.jpg", "P-1.png"] {
            blobs
                .upload(
                    path,
                    Blob {
                        content_type: "image/png".into(),
                        data: Bytes::from_static(b"x"),
                    },
                )
                .await
                .unwrap();
        }
        let service = ImageService::new(blobs, "/static/placeholder.png".into(), None);
        assert_eq!(service.resolve("P-1").await, "memory://P-1.png");
        assert_eq!(service.resolve("P-2").await, "/static/placeholder.png");
    }

    #[tokio::test]
    async fn errors_fall_through_and_results_are_cached() {
        let mut blobs = MockBlobStore::new();
        blobs
            .expect_exists()
            .times(3)
            .returning(|path| match path {
                "P-1.png" => Err(StoreError::Backend("denied".into())),
                "P-1.jpg" => Ok(false),
                _ => Ok(true),
            });
        blobs
            .expect_public_url()
            .returning(|path| format!("https://cdn/{path}"));
        let service = ImageService::new(Arc::new(blobs), "placeholder".into(), None);

        assert_eq!(service.resolve("P-1").await, "https://cdn/P-1.webp");
        assert_eq!(service.resolve("P-1").await, "https://cdn/P-1.webp");
    }
}
