//! Property-based tests for the catalogue pipeline.
//!
//! Catalogues are generated with random suppliers, stock levels and prices;
//! the properties hold for any filter and page size.

use parts_catalog::catalog::{self, CatalogQuery, PartMap, SortKey, SortOrder, SupplierFilter};
use parts_catalog::models::PartRecord;
use proptest::prelude::*;
use serde_json::json;

fn supplier_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("Bosch".to_string())),
        Just(Some("Mann".to_string())),
        Just(Some("NGK".to_string())),
    ]
}

fn part_strategy() -> impl Strategy<Value = (String, serde_json::Value)> {
    (
        "[A-Za-z]{2}-[0-9]{1,4}",
        supplier_strategy(),
        0u64..50,
        proptest::option::of(0u32..100_000),
        "[a-z ]{0,20}",
    )
        .prop_map(|(code, supplier, stock, cents, description)| {
            let mut raw = json!({"stockQty": stock, "description": description});
            if let Some(supplier) = supplier {
                raw["supplier"] = json!(supplier);
            }
            if let Some(cents) = cents {
                raw["standardPrice"] = json!(format!("{}.{:02}", cents / 100, cents % 100));
            }
            (code, raw)
        })
}

fn catalog_strategy() -> impl Strategy<Value = PartMap> {
    proptest::collection::vec(part_strategy(), 0..60).prop_map(|parts| {
        parts
            .into_iter()
            .map(|(code, raw)| {
                let record = PartRecord::from_raw(&code, &raw);
                (code, record)
            })
            .collect()
    })
}

fn codes(items: &[PartRecord]) -> Vec<String> {
    items.iter().map(|p| p.code.clone()).collect()
}

fn everything(page_size: usize) -> CatalogQuery {
    CatalogQuery {
        page_size,
        ..Default::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn all_suppliers_without_stock_filter_returns_every_part(parts in catalog_strategy()) {
        let page = catalog::run(&parts, &everything(usize::MAX));
        prop_assert_eq!(page.total, parts.len());
        prop_assert_eq!(page.items.len(), parts.len());
    }

    #[test]
    fn stock_only_is_a_subset_of_the_unfiltered_result(
        parts in catalog_strategy(),
        supplier in supplier_strategy(),
    ) {
        let supplier = SupplierFilter::from_param(supplier.as_deref());
        let all = catalog::run(&parts, &CatalogQuery {
            supplier: supplier.clone(),
            page_size: usize::MAX,
            ..Default::default()
        });
        let in_stock = catalog::run(&parts, &CatalogQuery {
            supplier,
            stock_only: true,
            page_size: usize::MAX,
            ..Default::default()
        });

        prop_assert!(in_stock.total <= all.total);
        prop_assert!(in_stock.items.iter().all(|p| p.stock > 0));
        let all_codes = codes(&all.items);
        prop_assert!(in_stock.items.iter().all(|p| all_codes.contains(&p.code)));
    }

    #[test]
    fn reversed_price_order_is_exact_reverse_for_distinct_prices(parts in catalog_strategy()) {
        let mut seen = std::collections::HashSet::new();
        let distinct: PartMap = parts
            .into_iter()
            .filter(|(_, p)| seen.insert(p.standard_price.unwrap_or_default()))
            .collect();

        let query = |order| CatalogQuery {
            sort: SortKey::Price,
            order: Some(order),
            page_size: usize::MAX,
            ..Default::default()
        };
        let asc = catalog::run(&distinct, &query(SortOrder::Asc));
        let desc = catalog::run(&distinct, &query(SortOrder::Desc));

        let mut reversed = codes(&asc.items);
        reversed.reverse();
        prop_assert_eq!(reversed, codes(&desc.items));
    }

    #[test]
    fn equal_prices_keep_their_code_order(parts in catalog_strategy()) {
        let page = catalog::run(&parts, &CatalogQuery {
            sort: SortKey::Price,
            page_size: usize::MAX,
            ..Default::default()
        });
        for pair in page.items.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let price = |p: &PartRecord| p.standard_price.unwrap_or_default();
            prop_assert!(price(a) >= price(b));
            if price(a) == price(b) {
                prop_assert!(catalog::query::locale_cmp(&a.code, &b.code).is_lt());
            }
        }
    }

    #[test]
    fn concatenated_pages_rebuild_the_filtered_sequence(
        parts in catalog_strategy(),
        page_size in 1usize..12,
        stock_only in any::<bool>(),
    ) {
        let base = CatalogQuery { stock_only, ..Default::default() };
        let whole = catalog::run(&parts, &CatalogQuery { page_size: usize::MAX, ..base.clone() });

        let first = catalog::run(&parts, &CatalogQuery { page_size, ..base.clone() });
        let mut rebuilt = Vec::new();
        for page in 1..=first.total_pages {
            let chunk = catalog::run(&parts, &CatalogQuery { page, page_size, ..base.clone() });
            prop_assert!(chunk.items.len() <= page_size);
            rebuilt.extend(codes(&chunk.items));
        }

        prop_assert_eq!(first.total_pages, whole.total.div_ceil(page_size));
        prop_assert_eq!(rebuilt, codes(&whole.items));
    }
}

#[test]
fn empty_catalogue_yields_zero_pages() {
    let page = catalog::run(&PartMap::new(), &everything(10));
    assert_eq!(page.total, 0);
    assert_eq!(page.total_pages, 0);
    assert!(page.items.is_empty());
}
