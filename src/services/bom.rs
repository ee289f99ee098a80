use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::future::join_all;
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use crate::{
    errors::ServiceError,
    models::{BomLine, BomView, PartEnrichment},
    repositories::{BomRepository, PartRepository},
};

/// Bill of materials reference: per-model components enriched with live part data
#[derive(Clone, Debug)]
pub struct BomService {
    boms: Arc<BomRepository>,
    parts: Arc<PartRepository>,
}

impl BomService {
    pub fn new(boms: Arc<BomRepository>, parts: Arc<PartRepository>) -> Self {
        Self { boms, parts }
    }

    #[instrument(skip(self))]
    pub async fn models(&self) -> Result<Vec<String>, ServiceError> {
        Ok(self.boms.models().await?)
    }

    /// Components of `model` matching `query`, each joined with its part record.
    ///
    /// Part lookups run concurrently, one per unique component code. A lookup
    /// that fails or finds nothing leaves the line unenriched and is reported
    /// in `missing_parts`; it never fails the view.
    #[instrument(skip(self))]
    pub async fn components(
        &self,
        model: &str,
        query: Option<&str>,
    ) -> Result<Option<BomView>, ServiceError> {
        let Some(components) = self.boms.components(model).await? else {
            return Ok(None);
        };

        let needle = query.unwrap_or("").trim().to_lowercase();
        let selected: Vec<_> = components
            .iter()
            .filter(|component| component.matches(&needle))
            .cloned()
            .collect();

        let codes: BTreeSet<String> = selected
            .iter()
            .map(|c| c.component_code.clone())
            .collect();
        let lookups = codes.into_iter().map(|code| async move {
            match self.parts.find(&code).await {
                Ok(part) => {
                    let part = part.as_ref().map(PartEnrichment::from);
                    (code, part)
                }
                Err(e) => {
                    warn!(code = %code, "Part lookup failed, skipping enrichment: {}", e);
                    (code, None)
                }
            }
        });
        let enrichment: HashMap<String, Option<PartEnrichment>> =
            join_all(lookups).await.into_iter().collect();

        let mut missing_parts: Vec<String> = enrichment
            .iter()
            .filter(|(_, part)| part.is_none())
            .map(|(code, _)| code.clone())
            .collect();
        missing_parts.sort();

        let total_standard_price = selected
            .iter()
            .filter_map(|c| c.standard_price)
            .fold(Decimal::ZERO, |acc, price| acc + price);

        let lines: Vec<BomLine> = selected
            .into_iter()
            .map(|component| {
                let part = enrichment
                    .get(&component.component_code)
                    .cloned()
                    .flatten();
                BomLine { component, part }
            })
            .collect();

        info!(
            "BoM view built: model={}, lines={}, missing={}",
            model,
            lines.len(),
            missing_parts.len()
        );

        Ok(Some(BomView {
            model: model.to_string(),
            component_count: lines.len(),
            lines,
            total_standard_price,
            missing_parts,
        }))
    }
}
