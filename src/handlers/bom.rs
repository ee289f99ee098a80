use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use super::common::{degrade_lookup, degrade_read};
use crate::{handlers::AppState, models::BomView, ApiResult};

#[derive(Debug, Default, Deserialize, Serialize, IntoParams)]
pub struct BomQueryParams {
    /// Free text matched against component code, description and supplier
    pub q: Option<String>,
}

/// Vehicle models that have a bill of materials
#[utoipa::path(
    get,
    path = "/api/v1/bom/models",
    responses((status = 200, description = "Model keys", body = crate::ApiResponse<Vec<String>>)),
    tag = "BoM"
)]
pub async fn list_models(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    degrade_read(state.services.bom.models().await, Vec::new())
}

/// Components of one model, enriched with live part data where available
#[utoipa::path(
    get,
    path = "/api/v1/bom/models/{model}",
    params(
        ("model" = String, Path, description = "Model and year key"),
        BomQueryParams
    ),
    responses(
        (status = 200, description = "Bill of materials", body = crate::ApiResponse<BomView>),
        (status = 404, description = "Unknown model", body = crate::errors::ErrorResponse)
    ),
    tag = "BoM"
)]
pub async fn get_model_components(
    State(state): State<AppState>,
    Path(model): Path<String>,
    Query(params): Query<BomQueryParams>,
) -> ApiResult<BomView> {
    let result = state
        .services
        .bom
        .components(&model, params.q.as_deref())
        .await;
    degrade_lookup(result, || format!("BoM model {} not found", model))
}
