//! In-memory search, filtering, sorting and pagination over the part mapping,
//! plus the aggregates shown on the summary page.

use std::collections::BTreeMap;

use crate::models::PartRecord;

pub mod query;
pub mod summary;

pub use query::{
    paginate, run, total_pages, CatalogPage, CatalogQuery, SortKey, SortOrder, SupplierFilter,
    DEFAULT_PAGE_SIZE,
};
pub use summary::{summarize, suppliers, CatalogSummary, SupplierBreakdown};

/// Part code to normalized record, iterated in code order
pub type PartMap = BTreeMap<String, PartRecord>;
