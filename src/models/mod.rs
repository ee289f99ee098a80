//! Typed records of the parts catalogue.
//!
//! Everything read from the store passes through `normalize` once, at the
//! data-access boundary; code above this layer never sees raw JSON.

pub mod application;
pub mod bom;
pub mod normalize;
pub mod part;

pub use application::{ApplicationStatus, ImageUpload, NewApplication, PartApplication, Urgency};
pub use bom::{BomComponent, BomLine, BomView, PartEnrichment};
pub use part::{AdminFields, PartAdminUpdate, PartRecord, TradeFigures};
