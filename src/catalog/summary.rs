use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{query::locale_cmp, PartMap};

pub const UNKNOWN_SUPPLIER: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SupplierBreakdown {
    pub supplier: String,
    pub part_count: usize,
    pub stock_units: u64,
    pub sales_amount: Decimal,
    pub purchase_amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CatalogSummary {
    pub part_count: usize,
    pub in_stock_count: usize,
    pub stock_units: u64,
    pub stock_value: Decimal,
    pub sales_quantity: Decimal,
    pub sales_amount: Decimal,
    pub purchase_quantity: Decimal,
    pub purchase_amount: Decimal,
    pub suppliers: Vec<SupplierBreakdown>,
}

/// Distinct non-empty supplier names for the filter dropdown
pub fn suppliers(parts: &PartMap) -> Vec<String> {
    let mut names: Vec<String> = parts
        .values()
        .filter_map(|part| part.supplier.clone())
        .collect();
    names.sort_by(|a, b| locale_cmp(a, b));
    names.dedup();
    names
}

pub fn summarize(parts: &PartMap) -> CatalogSummary {
    let mut summary = CatalogSummary::default();
    let mut by_supplier: BTreeMap<String, SupplierBreakdown> = BTreeMap::new();

    for part in parts.values() {
        let sales_amount = part.sales.amount.unwrap_or(Decimal::ZERO);
        let purchase_amount = part.purchases.amount.unwrap_or(Decimal::ZERO);

        summary.part_count += 1;
        if part.in_stock() {
            summary.in_stock_count += 1;
        }
        summary.stock_units = summary.stock_units.saturating_add(part.stock);
        summary.stock_value += part.stock_value();
        summary.sales_quantity += part.sales.quantity.unwrap_or(Decimal::ZERO);
        summary.sales_amount += sales_amount;
        summary.purchase_quantity += part.purchases.quantity.unwrap_or(Decimal::ZERO);
        summary.purchase_amount += purchase_amount;

        let supplier = part.supplier.as_deref().unwrap_or(UNKNOWN_SUPPLIER);
        let entry = by_supplier
            .entry(supplier.to_string())
            .or_insert_with(|| SupplierBreakdown {
                supplier: supplier.to_string(),
                ..Default::default()
            });
        entry.part_count += 1;
        entry.stock_units = entry.stock_units.saturating_add(part.stock);
        entry.sales_amount += sales_amount;
        entry.purchase_amount += purchase_amount;
    }

    let mut breakdown: Vec<SupplierBreakdown> = by_supplier.into_values().collect();
    breakdown.sort_by(|a, b| {
        b.sales_amount
            .cmp(&a.sales_amount)
            .then_with(|| locale_cmp(&a.supplier, &b.supplier))
    });
    summary.suppliers = breakdown;
    summary
}
