pub mod admin;
pub mod applications;
pub mod bom;
pub mod common;
pub mod parts;

use slog::Logger;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::logging::component_logger;
use crate::pdf::PdfExporter;
use crate::repositories::{ApplicationRepository, BomRepository, PartRepository};
use crate::services::{AdminService, ApplicationService, BomService, CatalogService, ImageService};
use crate::Backends;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone, Debug)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub bom: Arc<BomService>,
    pub images: Arc<ImageService>,
    pub applications: Arc<ApplicationService>,
    pub admin: Arc<AdminService>,
    pub pdf: Arc<PdfExporter>,
    pub default_page_size: usize,
}

impl AppServices {
    /// Wires repositories and services over the given backends. Cached
    /// snapshots share the configured TTL.
    pub fn new(backends: &Backends, config: &AppConfig, base_logger: &Logger) -> Self {
        let ttl = config.catalog.cache_ttl();

        let parts = Arc::new(PartRepository::new(backends.documents.clone(), ttl));
        let boms = Arc::new(BomRepository::new(backends.documents.clone(), ttl));
        let tickets = Arc::new(ApplicationRepository::new(backends.documents.clone()));

        let images = Arc::new(ImageService::new(
            backends.blobs.clone(),
            config.catalog.placeholder_image_url.clone(),
            ttl,
        ));
        let catalog = Arc::new(CatalogService::new(
            parts.clone(),
            config.catalog.max_page_size,
        ));
        let bom = Arc::new(BomService::new(boms.clone(), parts.clone()));
        let applications = Arc::new(ApplicationService::new(
            tickets,
            backends.blobs.clone(),
            component_logger(base_logger, "applications_service"),
        ));
        let admin = Arc::new(AdminService::new(
            parts,
            boms,
            images.clone(),
            backends.blobs.clone(),
            component_logger(base_logger, "admin_service"),
        ));
        let pdf = Arc::new(PdfExporter::with_font_file(
            backends.blobs.clone(),
            config.cjk_font_path().as_deref(),
        ));

        Self {
            catalog,
            bom,
            images,
            applications,
            admin,
            pdf,
            default_page_size: config.catalog.default_page_size,
        }
    }
}
