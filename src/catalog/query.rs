use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

use super::PartMap;
use crate::models::PartRecord;

pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Supplier dropdown value: every supplier, or exactly one
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SupplierFilter {
    #[default]
    All,
    Exact(String),
}

impl SupplierFilter {
    /// `None`, blank and `all` (any case) select every supplier
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            None | Some("") => SupplierFilter::All,
            Some(value) if value.eq_ignore_ascii_case("all") => SupplierFilter::All,
            Some(value) => SupplierFilter::Exact(value.to_string()),
        }
    }

    fn accepts(&self, supplier: Option<&str>) -> bool {
        match self {
            SupplierFilter::All => true,
            SupplierFilter::Exact(wanted) => supplier == Some(wanted.as_str()),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortKey {
    #[default]
    Code,
    Price,
    Stock,
    Supplier,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn reversed(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl SortKey {
    /// Codes and suppliers read A to Z; prices and stock show the largest first
    pub fn default_order(self) -> SortOrder {
        match self {
            SortKey::Code | SortKey::Supplier => SortOrder::Asc,
            SortKey::Price | SortKey::Stock => SortOrder::Desc,
        }
    }
}

/// Everything the catalogue page can ask for in one request
#[derive(Debug, Clone)]
pub struct CatalogQuery {
    pub text: String,
    pub supplier: SupplierFilter,
    pub stock_only: bool,
    pub sort: SortKey,
    /// Overrides the key's implicit direction
    pub order: Option<SortOrder>,
    /// 1-indexed; 0 is read as 1
    pub page: usize,
    pub page_size: usize,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            text: String::new(),
            supplier: SupplierFilter::All,
            stock_only: false,
            sort: SortKey::Code,
            order: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl CatalogQuery {
    pub fn effective_order(&self) -> SortOrder {
        self.order.unwrap_or_else(|| self.sort.default_order())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CatalogPage {
    pub items: Vec<PartRecord>,
    pub page: usize,
    pub page_size: usize,
    /// Records passing the filters, across all pages
    pub total: usize,
    pub total_pages: usize,
}

/// Case-insensitive containment on code, description or supplier
pub fn matches_text(part: &PartRecord, needle_lowercase: &str) -> bool {
    if needle_lowercase.is_empty() {
        return true;
    }
    let contains = |field: &str| field.to_lowercase().contains(needle_lowercase);
    contains(&part.code)
        || part.description.as_deref().is_some_and(contains)
        || part.supplier.as_deref().is_some_and(contains)
}

/// Records passing the supplier, stock and text filters, in code order
pub fn filter<'a>(parts: &'a PartMap, query: &CatalogQuery) -> Vec<&'a PartRecord> {
    let needle = query.text.trim().to_lowercase();
    parts
        .values()
        .filter(|part| query.supplier.accepts(part.supplier.as_deref()))
        .filter(|part| !query.stock_only || part.in_stock())
        .filter(|part| matches_text(part, &needle))
        .collect()
}

/// Case-folded comparison first, raw text as the tiebreaker
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn compare(a: &PartRecord, b: &PartRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Code => locale_cmp(&a.code, &b.code),
        SortKey::Price => a
            .standard_price
            .unwrap_or(Decimal::ZERO)
            .cmp(&b.standard_price.unwrap_or(Decimal::ZERO)),
        SortKey::Stock => a.stock.cmp(&b.stock),
        SortKey::Supplier => locale_cmp(
            a.supplier.as_deref().unwrap_or(""),
            b.supplier.as_deref().unwrap_or(""),
        ),
    }
}

/// Ties on the sort key fall back to ascending case-folded code order in both directions
pub fn sort(records: &mut [&PartRecord], key: SortKey, order: SortOrder) {
    records.sort_by(|a, b| {
        let primary = match order {
            SortOrder::Asc => compare(a, b, key),
            SortOrder::Desc => compare(b, a, key),
        };
        primary.then_with(|| locale_cmp(&a.code, &b.code))
    });
}

pub fn total_pages(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// One 1-indexed page of `items`; pages past the end are empty
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Vec<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return Vec::new();
    }
    let end = start.saturating_add(page_size).min(items.len());
    items[start..end].to_vec()
}

/// Filter, sort and paginate in one pass over the loaded mapping
pub fn run(parts: &PartMap, query: &CatalogQuery) -> CatalogPage {
    let page_size = query.page_size.max(1);
    let page = query.page.max(1);

    let mut records = filter(parts, query);
    sort(&mut records, query.sort, query.effective_order());

    let total = records.len();
    let items = paginate(&records, page, page_size)
        .into_iter()
        .cloned()
        .collect();

    CatalogPage {
        items,
        page,
        page_size,
        total,
        total_pages: total_pages(total, page_size),
    }
}
