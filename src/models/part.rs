use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::normalize;

/// Raw keys of a part record in `parts-collection`
pub mod keys {
    pub const DESCRIPTION: &str = "description";
    pub const STANDARD_PRICE: &str = "standardPrice";
    pub const DEALER_PRICE: &str = "dealerPrice";
    pub const CUSTOMER_PRICE: &str = "customerPrice";
    pub const STOCK_QTY: &str = "stockQty";
    pub const SUPPLIER: &str = "supplier";
    pub const SALES_QTY: &str = "salesQty";
    pub const SALES_AMOUNT: &str = "salesAmount";
    pub const PURCHASE_QTY: &str = "purchaseQty";
    pub const PURCHASE_AMOUNT: &str = "purchaseAmount";
    pub const DEALER_MARGIN: &str = "dealerMargin";
    pub const CUSTOMER_MARGIN: &str = "customerMargin";
    pub const NOTES: &str = "notes";
    pub const YEAR: &str = "year";
    pub const OBSOLETE_DATE: &str = "obsoleteDate";
    pub const ALTERNATIVES: &str = "alternatives";
}

/// Quantity and invoiced amount for the reporting year
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TradeFigures {
    pub quantity: Option<Decimal>,
    pub amount: Option<Decimal>,
}

/// Fields maintained through the admin screen
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AdminFields {
    pub notes: Option<String>,
    pub year: Option<String>,
    pub obsolete_date: Option<String>,
    pub alternatives: Vec<String>,
}

/// One purchasable component, keyed by its part code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PartRecord {
    pub code: String,
    pub description: Option<String>,
    pub standard_price: Option<Decimal>,
    pub dealer_price: Option<Decimal>,
    pub customer_price: Option<Decimal>,
    pub stock: u64,
    pub supplier: Option<String>,
    pub sales: TradeFigures,
    pub purchases: TradeFigures,
    pub dealer_margin_pct: Option<Decimal>,
    pub customer_margin_pct: Option<Decimal>,
    pub admin: AdminFields,
}

impl PartRecord {
    /// Normalizes a raw store record. Non-object values yield a record with
    /// only the code set.
    pub fn from_raw(code: &str, raw: &Value) -> Self {
        let empty = Map::new();
        let raw = raw.as_object().unwrap_or(&empty);
        Self {
            code: code.to_string(),
            description: normalize::text(raw, keys::DESCRIPTION),
            standard_price: normalize::decimal(raw, keys::STANDARD_PRICE),
            dealer_price: normalize::decimal(raw, keys::DEALER_PRICE),
            customer_price: normalize::decimal(raw, keys::CUSTOMER_PRICE),
            stock: normalize::quantity(raw, keys::STOCK_QTY),
            supplier: normalize::text(raw, keys::SUPPLIER),
            sales: TradeFigures {
                quantity: normalize::decimal(raw, keys::SALES_QTY),
                amount: normalize::decimal(raw, keys::SALES_AMOUNT),
            },
            purchases: TradeFigures {
                quantity: normalize::decimal(raw, keys::PURCHASE_QTY),
                amount: normalize::decimal(raw, keys::PURCHASE_AMOUNT),
            },
            dealer_margin_pct: normalize::decimal(raw, keys::DEALER_MARGIN),
            customer_margin_pct: normalize::decimal(raw, keys::CUSTOMER_MARGIN),
            admin: AdminFields {
                notes: normalize::text(raw, keys::NOTES),
                year: normalize::text(raw, keys::YEAR),
                obsolete_date: normalize::text(raw, keys::OBSOLETE_DATE),
                alternatives: normalize::text(raw, keys::ALTERNATIVES)
                    .map(|list| normalize::code_list(&list))
                    .unwrap_or_default(),
            },
        }
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Standard price times stock, missing price counting as zero
    pub fn stock_value(&self) -> Decimal {
        self.standard_price.unwrap_or(Decimal::ZERO) * Decimal::from(self.stock)
    }
}

/// Partial update of the admin fields. Absent fields are left untouched;
/// an empty string clears a field.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct PartAdminUpdate {
    #[validate(length(max = 4000))]
    pub notes: Option<String>,
    #[validate(custom = "validate_year")]
    pub year: Option<String>,
    #[validate(custom = "validate_obsolete_date")]
    pub obsolete_date: Option<String>,
    #[validate(length(max = 2000))]
    pub alternatives: Option<String>,
}

impl PartAdminUpdate {
    pub fn is_empty(&self) -> bool {
        self.notes.is_none()
            && self.year.is_none()
            && self.obsolete_date.is_none()
            && self.alternatives.is_none()
    }

    /// Overlays the present fields onto a raw record, leaving every other key as stored
    pub fn merge_into(&self, code: &str, raw: &mut Map<String, Value>) {
        let mut put = |key: &str, value: &Option<String>| {
            if let Some(value) = value {
                raw.insert(key.to_string(), Value::String(value.trim().to_string()));
            }
        };
        put(keys::NOTES, &self.notes);
        put(keys::YEAR, &self.year);
        put(keys::OBSOLETE_DATE, &self.obsolete_date);

        if let Some(alternatives) = &self.alternatives {
            let cleaned: Vec<String> = normalize::code_list(alternatives)
                .into_iter()
                .filter(|alt| !alt.eq_ignore_ascii_case(code))
                .collect();
            raw.insert(
                keys::ALTERNATIVES.to_string(),
                Value::String(cleaned.join(",")),
            );
        }
    }
}

fn validate_year(year: &str) -> Result<(), ValidationError> {
    let year = year.trim();
    if year.is_empty() || (year.len() == 4 && year.chars().all(|c| c.is_ascii_digit())) {
        Ok(())
    } else {
        let mut err = ValidationError::new("year");
        err.message = Some("year must be four digits".into());
        Err(err)
    }
}

fn validate_obsolete_date(date: &str) -> Result<(), ValidationError> {
    let date = date.trim();
    if date.is_empty() || NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok() {
        Ok(())
    } else {
        let mut err = ValidationError::new("obsolete_date");
        err.message = Some("obsolete_date must be formatted YYYY-MM-DD".into());
        Err(err)
    }
}
