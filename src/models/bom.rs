use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::{normalize, part::PartRecord};

pub mod keys {
    pub const DESCRIPTION: &str = "description";
    pub const STANDARD_PRICE: &str = "standardPrice";
    pub const SUPPLIER: &str = "supplier";
}

/// Component of a vehicle model's bill of materials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BomComponent {
    pub model: String,
    pub component_code: String,
    pub description: Option<String>,
    pub standard_price: Option<Decimal>,
    pub supplier: Option<String>,
}

impl BomComponent {
    pub fn from_raw(model: &str, component_code: &str, raw: &Value) -> Self {
        let empty = Map::new();
        let raw = raw.as_object().unwrap_or(&empty);
        Self {
            model: model.to_string(),
            component_code: component_code.to_string(),
            description: normalize::text(raw, keys::DESCRIPTION),
            standard_price: normalize::decimal(raw, keys::STANDARD_PRICE),
            supplier: normalize::text(raw, keys::SUPPLIER),
        }
    }

    pub fn matches(&self, needle_lowercase: &str) -> bool {
        needle_lowercase.is_empty()
            || self.component_code.to_lowercase().contains(needle_lowercase)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle_lowercase))
            || self
                .supplier
                .as_deref()
                .is_some_and(|s| s.to_lowercase().contains(needle_lowercase))
    }
}

/// Catalogue details attached to a BoM line when the part lookup succeeds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PartEnrichment {
    pub stock: u64,
    pub dealer_price: Option<Decimal>,
    pub customer_price: Option<Decimal>,
    pub notes: Option<String>,
    pub obsolete_date: Option<String>,
    pub alternatives: Vec<String>,
}

impl From<&PartRecord> for PartEnrichment {
    fn from(part: &PartRecord) -> Self {
        Self {
            stock: part.stock,
            dealer_price: part.dealer_price,
            customer_price: part.customer_price,
            notes: part.admin.notes.clone(),
            obsolete_date: part.admin.obsolete_date.clone(),
            alternatives: part.admin.alternatives.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BomLine {
    #[serde(flatten)]
    pub component: BomComponent,
    /// `None` when the part could not be found or fetched
    pub part: Option<PartEnrichment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BomView {
    pub model: String,
    pub lines: Vec<BomLine>,
    pub component_count: usize,
    pub total_standard_price: Decimal,
    /// Component codes whose part lookup came back empty or failed
    pub missing_parts: Vec<String>,
}
