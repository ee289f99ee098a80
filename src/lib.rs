//! Parts catalogue library
//!
//! Inventory search, BoM reference, part request tickets with PDF export and
//! part metadata administration over a remote document store.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod cache;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod i18n;
pub mod logging;
pub mod middleware_helpers;
pub mod models;
pub mod openapi;
pub mod pdf;
pub mod repositories;
pub mod services;
pub mod store;
pub mod tracing;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, patch, post, put},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::store::{
    BlobStore, DocumentStore, FirebaseBlobStore, FirebaseStore, InMemoryBlobStore, InMemoryStore,
    StoreError,
};

#[derive(Clone)]
pub struct AppState {
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
    pub store: Arc<dyn DocumentStore>,
}

// Common response wrappers
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    /// Read that could not reach the store: an empty payload flagged as failed
    pub fn degraded(empty: Option<T>, message: String) -> Self {
        Self {
            success: false,
            data: empty,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}


/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes() -> Router<AppState> {
    let parts = Router::new()
        .route("/parts", get(handlers::parts::list_parts))
        .route("/parts/suppliers", get(handlers::parts::list_suppliers))
        .route("/parts/summary", get(handlers::parts::catalog_summary))
        .route("/parts/:code", get(handlers::parts::get_part))
        .route("/parts/:code/image", get(handlers::parts::get_part_image));

    let bom = Router::new()
        .route("/bom/models", get(handlers::bom::list_models))
        .route("/bom/models/:model", get(handlers::bom::get_model_components));

    let applications = Router::new()
        .route(
            "/applications",
            post(handlers::applications::submit_application)
                .get(handlers::applications::list_applications),
        )
        .route("/applications/:id", get(handlers::applications::get_application))
        .route(
            "/applications/:id/status",
            get(handlers::applications::get_application_status),
        )
        .route(
            "/applications/:id/pdf",
            get(handlers::applications::export_application_pdf),
        );

    let admin = Router::new()
        .route("/admin/parts/:code", patch(handlers::admin::update_part))
        .route("/admin/parts/:code/image", put(handlers::admin::upload_part_image))
        .route("/admin/cache/invalidate", post(handlers::admin::invalidate_caches));

    Router::new()
        .merge(parts)
        .merge(bom)
        .merge(applications)
        .merge(admin)
}

async fn status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "store_backend": state.config.store.backend,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Full application router: API, health, status and Swagger UI, with request
/// ids and HTTP tracing applied. CORS, compression and static files are added
/// by the binary.
pub fn app_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_size;
    let store = state.store.clone();

    Router::new()
        .route("/status", get(status))
        .nest("/api/v1", api_v1_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .nest("/health", health::health_routes(store))
        .merge(openapi::swagger_ui())
        .layer(crate::tracing::configure_http_tracing())
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
}

/// Document and blob store backends selected by configuration
#[derive(Clone, Debug)]
pub struct Backends {
    pub documents: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStore>,
}

impl Backends {
    pub fn in_memory(seed: Value) -> Self {
        Self {
            documents: Arc::new(InMemoryStore::with_data(seed)),
            blobs: Arc::new(InMemoryBlobStore::new()),
        }
    }
}

pub fn connect_backends(config: &config::StoreConfig) -> Result<Backends, StoreError> {
    if config.is_firebase() {
        let database_url = config
            .database_url
            .clone()
            .ok_or_else(|| StoreError::Backend("store.database_url is not set".to_string()))?;
        let bucket = config
            .storage_bucket
            .clone()
            .ok_or_else(|| StoreError::Backend("store.storage_bucket is not set".to_string()))?;

        let documents = FirebaseStore::new(
            database_url,
            config.auth_token.clone(),
            config.request_timeout(),
        )?;
        let blobs = FirebaseBlobStore::new(
            config.storage_api_url.clone(),
            bucket,
            config.auth_token.clone(),
            config.request_timeout(),
        )?;
        return Ok(Backends {
            documents: Arc::new(documents),
            blobs: Arc::new(blobs),
        });
    }

    let seed = match &config.seed_file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| StoreError::Backend(format!("cannot read seed file {path}: {e}")))?;
            serde_json::from_str(&raw)?
        }
        None => Value::Object(Default::default()),
    };
    Ok(Backends::in_memory(seed))
}

pub mod prelude {
    pub use crate::catalog::{CatalogPage, CatalogQuery, SortKey, SortOrder, SupplierFilter};
    pub use crate::errors::*;
    pub use crate::models::*;
    pub use crate::services::*;
    pub use crate::store::{BlobStore, DocumentStore};
}
