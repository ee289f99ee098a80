use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::info;

use super::common::success_response;
use super::parts::PartImage;
use crate::{
    errors::ServiceError,
    handlers::AppState,
    models::{PartAdminUpdate, PartRecord},
    ApiResult,
};

/// Merge notes, year, obsolete date and alternatives into a part
#[utoipa::path(
    patch,
    path = "/api/v1/admin/parts/{code}",
    params(("code" = String, Path, description = "Part code")),
    request_body = PartAdminUpdate,
    responses(
        (status = 200, description = "Updated part", body = crate::ApiResponse<PartRecord>),
        (status = 400, description = "Invalid or empty update", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown part code", body = crate::errors::ErrorResponse),
        (status = 502, description = "Store unavailable", body = crate::errors::ErrorResponse)
    ),
    tag = "Admin"
)]
pub async fn update_part(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(update): Json<PartAdminUpdate>,
) -> ApiResult<PartRecord> {
    let part = state.services.admin.update_part(&code, update).await?;
    Ok(success_response(part))
}

/// Replace the part's picture with the raw request body
#[utoipa::path(
    put,
    path = "/api/v1/admin/parts/{code}/image",
    params(("code" = String, Path, description = "Part code")),
    request_body(content = Vec<u8>, content_type = "image/png", description = "PNG, JPEG or WebP bytes"),
    responses(
        (status = 200, description = "Stored image URL", body = crate::ApiResponse<PartImage>),
        (status = 400, description = "Unsupported or empty image", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown part code", body = crate::errors::ErrorResponse)
    ),
    tag = "Admin"
)]
pub async fn upload_part_image(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<PartImage> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ServiceError::InvalidInput("missing Content-Type header".to_string()))?;

    let url = state
        .services
        .admin
        .upload_part_image(&code, content_type, body)
        .await?;
    Ok(success_response(PartImage { code, url }))
}

/// Drop cached part, BoM and image snapshots so the next read hits the store
#[utoipa::path(
    post,
    path = "/api/v1/admin/cache/invalidate",
    responses((status = 204, description = "Caches cleared")),
    tag = "Admin"
)]
pub async fn invalidate_caches(State(state): State<AppState>) -> impl IntoResponse {
    state.services.admin.invalidate_caches().await;
    info!("catalogue caches invalidated");
    StatusCode::NO_CONTENT
}
