use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Parts Catalog API",
        version = "1.0.0",
        description = r#"
# Automotive Parts Catalogue

Inventory search, bill-of-materials reference, part request tickets and part
metadata administration.

## Degraded reads

When the parts database cannot be reached, read endpoints answer `200` with
`success: false`, an empty `data` payload and a generic `message`. Writes fail
with `502`.

## Pagination

`GET /parts` accepts `page` (1-indexed) and `page_size`; the response carries
`total` and `total_pages` for the filtered set.
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Parts", description = "Catalogue search and part details"),
        (name = "BoM", description = "Bill of materials reference"),
        (name = "Applications", description = "Part request tickets and PDF export"),
        (name = "Admin", description = "Part metadata and image maintenance")
    ),
    paths(
        crate::handlers::parts::list_parts,
        crate::handlers::parts::list_suppliers,
        crate::handlers::parts::catalog_summary,
        crate::handlers::parts::get_part,
        crate::handlers::parts::get_part_image,

        crate::handlers::bom::list_models,
        crate::handlers::bom::get_model_components,

        crate::handlers::applications::submit_application,
        crate::handlers::applications::list_applications,
        crate::handlers::applications::get_application,
        crate::handlers::applications::get_application_status,
        crate::handlers::applications::export_application_pdf,

        crate::handlers::admin::update_part,
        crate::handlers::admin::upload_part_image,
        crate::handlers::admin::invalidate_caches,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::ResponseMeta,

            crate::catalog::CatalogPage,
            crate::catalog::CatalogSummary,
            crate::catalog::SupplierBreakdown,
            crate::catalog::SortKey,
            crate::catalog::SortOrder,
            crate::models::PartRecord,
            crate::models::TradeFigures,
            crate::models::AdminFields,
            crate::models::PartAdminUpdate,
            crate::handlers::parts::PartImage,

            crate::models::BomComponent,
            crate::models::BomLine,
            crate::models::BomView,
            crate::models::PartEnrichment,

            crate::models::NewApplication,
            crate::models::ImageUpload,
            crate::models::PartApplication,
            crate::models::Urgency,
            crate::models::ApplicationStatus,
            crate::handlers::applications::SubmittedApplication,
            crate::handlers::applications::ApplicationStatusView,
            crate::i18n::Language,

            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
