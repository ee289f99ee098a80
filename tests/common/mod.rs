#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    Router,
};
use parts_catalog::{
    app_router,
    config::AppConfig,
    handlers::AppServices,
    logging::discard_logger,
    store::{DocumentStore, InMemoryBlobStore, InMemoryStore, StoreError},
    AppState, Backends,
};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const BOM_MODEL: &str = "X5-2020";

/// Catalogue used by most tests: six parts over three suppliers, one BoM
/// model whose third component has no part record.
pub fn seed() -> Value {
    json!({
        "parts-collection": {
            "BP-100": {
                "description": "Brake pad front",
                "standardPrice": "45.50",
                "dealerPrice": 40,
                "customerPrice": 55,
                "stockQty": 12,
                "supplier": "Bosch",
                "salesQty": 30,
                "salesAmount": "1650",
                "notes": "old"
            },
            "BP-200": {
                "description": "Brake pad rear",
                "standardPrice": 39,
                "stockQty": 0,
                "supplier": "Bosch"
            },
            "OF-10": {
                "description": "Oil filter",
                "standardPrice": 8.25,
                "stockQty": "140",
                "supplier": "Mann"
            },
            "AF-20": {
                "description": "Air filter",
                "standardPrice": 14,
                "stockQty": 3,
                "supplier": "Mann"
            },
            "SP-01": {
                "description": "Spark plug iridium",
                "standardPrice": 12,
                "stockQty": 64,
                "supplier": "NGK"
            },
            "WB-77": {
                "description": "Wiper blade",
                "stockQty": 0
            }
        },
        "bom-collection": {
            "X5-2020": {
                "BP-100": {"description": "Front brake pad set", "standardPrice": 45.5, "supplier": "Bosch"},
                "OF-10": {"description": "Engine oil filter", "standardPrice": 8.25, "supplier": "Mann"},
                "GX-999": {"description": "Gearbox mount", "standardPrice": 120, "supplier": "ZF"}
            },
            "Y3-2018": {
                "SP-01": {"description": "Spark plug", "standardPrice": 12, "supplier": "NGK"}
            }
        }
    })
}

/// Document store whose every call fails, as when the remote database is unreachable
#[derive(Debug, Default)]
pub struct OfflineStore;

fn offline() -> StoreError {
    StoreError::Backend("connection refused".to_string())
}

#[async_trait]
impl DocumentStore for OfflineStore {
    async fn get(&self, _path: &str) -> Result<Option<Value>, StoreError> {
        Err(offline())
    }

    async fn set(&self, _path: &str, _value: Value) -> Result<(), StoreError> {
        Err(offline())
    }

    async fn child_keys(&self, _path: &str) -> Result<Vec<String>, StoreError> {
        Err(offline())
    }

    fn generate_key(&self, _collection: &str) -> String {
        "offline-key".to_string()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(offline())
    }
}

/// Router over in-memory stores, driven in-process with `oneshot`
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub documents: Arc<dyn DocumentStore>,
    pub blobs: Arc<InMemoryBlobStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_documents(Arc::new(InMemoryStore::with_data(seed())))
    }

    pub fn offline() -> Self {
        Self::with_documents(Arc::new(OfflineStore))
    }

    pub fn with_documents(documents: Arc<dyn DocumentStore>) -> Self {
        let mut cfg = AppConfig::new("127.0.0.1".to_string(), 18_080, "test".to_string());
        cfg.cors_allow_any_origin = true;

        let blobs = Arc::new(InMemoryBlobStore::new());
        let backends = Backends {
            documents: documents.clone(),
            blobs: blobs.clone(),
        };
        let services = AppServices::new(&backends, &cfg, &discard_logger());
        let state = AppState {
            config: cfg,
            services,
            store: documents.clone(),
        };

        Self {
            router: app_router(state.clone()),
            state,
            documents,
            blobs,
        }
    }

    /// Send a request, with an optional JSON body
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Send raw bytes with an explicit content type
    pub async fn request_bytes(
        &self,
        method: Method,
        uri: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> axum::response::Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", content_type)
            .body(Body::from(bytes))
            .expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Submits a ticket and returns its id
    pub async fn submit(&self, body: Value) -> String {
        let response = self
            .request(Method::POST, "/api/v1/applications", Some(body))
            .await;
        assert_eq!(response.status(), 201, "submission rejected");
        let body = json_body(response).await;
        body["data"]["id"]
            .as_str()
            .expect("submission response carries an id")
            .to_string()
    }
}

pub async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body")
        .to_vec()
}

pub async fn json_body(response: axum::response::Response) -> Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("response body is not JSON")
}

/// Codes of the parts in a catalogue page response
pub fn item_codes(body: &Value) -> Vec<String> {
    body["data"]["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["code"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// One-pixel PNG, base64-encoded as the submission form sends it
pub const TINY_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub fn tiny_png() -> Vec<u8> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(TINY_PNG_BASE64)
        .expect("valid base64")
}
