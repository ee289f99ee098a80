/*!
 * # Health Check Module
 *
 * - Basic health check (`/health`) - process is up, with version and uptime
 * - Readiness check (`/health/ready`) - the document store answers a ping
 * - Version (`/health/version`) - build information
 */

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::store::DocumentStore;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct HealthDetail {
    pub status: HealthStatus,
    pub message: Option<String>,
    pub latency_ms: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct HealthInfo {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub details: HashMap<String, HealthDetail>,
}

#[derive(Clone, Debug)]
pub struct HealthState {
    store: Arc<dyn DocumentStore>,
    start_time: SystemTime,
}

impl HealthState {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            start_time: SystemTime::now(),
        }
    }

    pub fn uptime(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.start_time)
            .unwrap_or(Duration::from_secs(0))
            .as_secs()
    }

    /// Pings the document store and folds the result into an overall status
    pub async fn check(&self) -> HealthInfo {
        let started = std::time::Instant::now();
        let store = match self.store.ping().await {
            Ok(()) => HealthDetail {
                status: HealthStatus::Up,
                message: None,
                latency_ms: started.elapsed().as_millis() as u64,
            },
            Err(e) => {
                error!("Document store health check failed: {}", e);
                HealthDetail {
                    status: HealthStatus::Down,
                    message: Some("document store unreachable".to_string()),
                    latency_ms: started.elapsed().as_millis() as u64,
                }
            }
        };

        let status = store.status;
        let mut details = HashMap::new();
        details.insert("document_store".to_string(), store);

        HealthInfo {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            uptime_seconds: self.uptime(),
            details,
        }
    }
}

pub async fn version_info() -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "commit": option_env!("GIT_HASH").unwrap_or("unknown"),
    }))
}

/// Liveness: answers as long as the process serves requests
pub async fn health_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    debug!("Health check endpoint called");
    (
        StatusCode::OK,
        Json(json!({
            "status": HealthStatus::Up,
            "version": env!("CARGO_PKG_VERSION"),
            "uptime_seconds": state.uptime(),
            "timestamp": Utc::now(),
        })),
    )
}

/// Readiness: 503 while the document store cannot be reached
pub async fn readiness_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let health = state.check().await;
    let status_code = match health.status {
        HealthStatus::Up => StatusCode::OK,
        HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(health))
}

pub fn health_routes(store: Arc<dyn DocumentStore>) -> Router {
    let state = Arc::new(HealthState::new(store));
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/version", get(version_info))
        .with_state(state)
}
