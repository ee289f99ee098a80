use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use super::common::{degrade_lookup, degrade_read, success_response};
use crate::{
    catalog::{CatalogPage, CatalogQuery, CatalogSummary, SortKey, SortOrder, SupplierFilter},
    errors::ServiceError,
    handlers::AppState,
    models::PartRecord,
    ApiResult,
};

/// Query string of the catalogue search
#[derive(Debug, Default, Deserialize, Serialize, IntoParams)]
pub struct PartsQueryParams {
    /// Free text matched against code, description and supplier
    pub q: Option<String>,
    /// Exact supplier name, or `all`
    pub supplier: Option<String>,
    #[serde(default)]
    pub stock_only: bool,
    /// `code`, `price`, `stock` or `supplier`
    pub sort: Option<String>,
    /// `asc` or `desc`; defaults depend on `sort`
    pub order: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl PartsQueryParams {
    pub fn into_query(self, default_page_size: usize) -> Result<CatalogQuery, ServiceError> {
        let sort = match self.sort.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw
                .parse::<SortKey>()
                .map_err(|_| ServiceError::InvalidInput(format!("unknown sort key '{}'", raw)))?,
            None => SortKey::default(),
        };
        let order = match self.order.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                raw.parse::<SortOrder>()
                    .map_err(|_| ServiceError::InvalidInput(format!("unknown sort order '{}'", raw)))?,
            ),
            None => None,
        };

        Ok(CatalogQuery {
            text: self.q.unwrap_or_default(),
            supplier: SupplierFilter::from_param(self.supplier.as_deref()),
            stock_only: self.stock_only,
            sort,
            order,
            page: self.page.unwrap_or(1),
            page_size: self.page_size.unwrap_or(default_page_size),
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PartImage {
    pub code: String,
    pub url: String,
}

fn empty_page(query: &CatalogQuery) -> CatalogPage {
    CatalogPage {
        items: Vec::new(),
        page: query.page.max(1),
        page_size: query.page_size.max(1),
        total: 0,
        total_pages: 0,
    }
}

/// Search, filter, sort and paginate the catalogue
#[utoipa::path(
    get,
    path = "/api/v1/parts",
    params(PartsQueryParams),
    responses(
        (status = 200, description = "One page of matching parts", body = crate::ApiResponse<CatalogPage>),
        (status = 400, description = "Unknown sort key or order", body = crate::errors::ErrorResponse)
    ),
    tag = "Parts"
)]
pub async fn list_parts(
    State(state): State<AppState>,
    Query(params): Query<PartsQueryParams>,
) -> ApiResult<CatalogPage> {
    let query = params.into_query(state.services.default_page_size)?;
    let empty = empty_page(&query);
    let result = state.services.catalog.search(query).await;
    degrade_read(result, empty)
}

/// Distinct supplier names for the supplier dropdown
#[utoipa::path(
    get,
    path = "/api/v1/parts/suppliers",
    responses((status = 200, description = "Supplier names", body = crate::ApiResponse<Vec<String>>)),
    tag = "Parts"
)]
pub async fn list_suppliers(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    degrade_read(state.services.catalog.suppliers().await, Vec::new())
}

/// Stock and trade aggregates over the whole catalogue
#[utoipa::path(
    get,
    path = "/api/v1/parts/summary",
    responses((status = 200, description = "Catalogue summary", body = crate::ApiResponse<CatalogSummary>)),
    tag = "Parts"
)]
pub async fn catalog_summary(State(state): State<AppState>) -> ApiResult<CatalogSummary> {
    degrade_read(state.services.catalog.summary().await, CatalogSummary::default())
}

#[utoipa::path(
    get,
    path = "/api/v1/parts/{code}",
    params(("code" = String, Path, description = "Part code")),
    responses(
        (status = 200, description = "Part record", body = crate::ApiResponse<PartRecord>),
        (status = 404, description = "Unknown part code", body = crate::errors::ErrorResponse)
    ),
    tag = "Parts"
)]
pub async fn get_part(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<PartRecord> {
    degrade_lookup(state.services.catalog.part(&code).await, || {
        format!("Part {} not found", code)
    })
}

/// URL of the part's picture, or the placeholder when none is stored
#[utoipa::path(
    get,
    path = "/api/v1/parts/{code}/image",
    params(("code" = String, Path, description = "Part code")),
    responses((status = 200, description = "Resolved image URL", body = crate::ApiResponse<PartImage>)),
    tag = "Parts"
)]
pub async fn get_part_image(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<PartImage> {
    let url = state.services.images.resolve(&code).await;
    info!(code = %code, url = %url, "part image resolved");
    Ok(success_response(PartImage { code, url }))
}
