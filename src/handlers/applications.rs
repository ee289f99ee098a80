use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use super::common::{created_response, degrade_lookup, degrade_read};
use crate::{
    errors::ServiceError,
    handlers::AppState,
    i18n::Language,
    models::{ApplicationStatus, NewApplication, PartApplication},
    ApiResult,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmittedApplication {
    pub id: String,
    pub status: ApplicationStatus,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApplicationStatusView {
    pub id: String,
    pub status: ApplicationStatus,
}

#[derive(Debug, Default, Deserialize, Serialize, IntoParams)]
pub struct PdfQueryParams {
    /// `en` (default) or `zh`
    pub lang: Option<String>,
}

impl PdfQueryParams {
    pub fn language(&self) -> Result<Language, ServiceError> {
        match self.lang.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            Some(raw) => raw
                .parse::<Language>()
                .map_err(|_| ServiceError::InvalidInput(format!("unsupported language '{}'", raw))),
            None => Ok(Language::default()),
        }
    }
}

/// Submit a new part request ticket
#[utoipa::path(
    post,
    path = "/api/v1/applications",
    request_body = NewApplication,
    responses(
        (status = 201, description = "Ticket stored as pending", body = crate::ApiResponse<SubmittedApplication>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Missing or invalid fields", body = crate::errors::ErrorResponse),
        (status = 502, description = "Store unavailable, nothing persisted", body = crate::errors::ErrorResponse)
    ),
    tag = "Applications"
)]
pub async fn submit_application(
    State(state): State<AppState>,
    Json(payload): Json<NewApplication>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = state.services.applications.submit(payload).await?;
    Ok(created_response(SubmittedApplication {
        id,
        status: ApplicationStatus::Pending,
    }))
}

/// Every ticket, newest first
#[utoipa::path(
    get,
    path = "/api/v1/applications",
    responses((status = 200, description = "Tickets", body = crate::ApiResponse<Vec<PartApplication>>)),
    tag = "Applications"
)]
pub async fn list_applications(State(state): State<AppState>) -> ApiResult<Vec<PartApplication>> {
    degrade_read(state.services.applications.fetch_all().await, Vec::new())
}

#[utoipa::path(
    get,
    path = "/api/v1/applications/{id}",
    params(("id" = String, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Ticket", body = crate::ApiResponse<PartApplication>),
        (status = 404, description = "Unknown ticket", body = crate::errors::ErrorResponse)
    ),
    tag = "Applications"
)]
pub async fn get_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<PartApplication> {
    degrade_lookup(state.services.applications.fetch_by_id(&id).await, || {
        format!("Application {} not found", id)
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/applications/{id}/status",
    params(("id" = String, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Current status", body = crate::ApiResponse<ApplicationStatusView>),
        (status = 404, description = "Unknown ticket", body = crate::errors::ErrorResponse)
    ),
    tag = "Applications"
)]
pub async fn get_application_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApplicationStatusView> {
    let result = state
        .services
        .applications
        .status(&id)
        .await
        .map(|status| {
            status.map(|status| ApplicationStatusView {
                id: id.clone(),
                status,
            })
        });
    degrade_lookup(result, || format!("Application {} not found", id))
}

/// Render the ticket as a PDF download named `{id}_{lang}.pdf`
#[utoipa::path(
    get,
    path = "/api/v1/applications/{id}/pdf",
    params(("id" = String, Path, description = "Ticket id"), PdfQueryParams),
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf"),
        (status = 400, description = "Unsupported language or incomplete ticket", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown ticket", body = crate::errors::ErrorResponse)
    ),
    tag = "Applications"
)]
pub async fn export_application_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PdfQueryParams>,
) -> Result<Response, ServiceError> {
    let lang = params.language()?;
    let ticket = state
        .services
        .applications
        .fetch_by_id(&id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Application {} not found", id)))?;

    let export = state.services.pdf.export(&ticket, lang).await?;
    info!(id = %id, lang = %lang, size = export.bytes.len(), "application exported");

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        export.filename
    ))
    .map_err(|e| ServiceError::InternalError(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.bytes,
    )
        .into_response())
}
