// Catalogue read side
pub mod catalog;
pub mod images;

// BoM reference
pub mod bom;

// Ticket workflow
pub mod applications;

// Admin surface
pub mod admin;

pub use admin::AdminService;
pub use applications::ApplicationService;
pub use bom::BomService;
pub use catalog::CatalogService;
pub use images::ImageService;
