use std::sync::Arc;

use tracing::{error, instrument};

use crate::{
    catalog::{self, CatalogPage, CatalogQuery, CatalogSummary},
    errors::ServiceError,
    models::PartRecord,
    repositories::PartRepository,
};

/// Read side of the parts catalogue
#[derive(Clone, Debug)]
pub struct CatalogService {
    parts: Arc<PartRepository>,
    max_page_size: usize,
}

impl CatalogService {
    pub fn new(parts: Arc<PartRepository>, max_page_size: usize) -> Self {
        Self {
            parts,
            max_page_size: max_page_size.max(1),
        }
    }

    /// Runs the search pipeline over a fresh or cached snapshot of the catalogue
    #[instrument(skip(self), fields(q = %query.text, page = query.page))]
    pub async fn search(&self, mut query: CatalogQuery) -> Result<CatalogPage, ServiceError> {
        query.page_size = query.page_size.clamp(1, self.max_page_size);
        let parts = self.parts.all().await.map_err(|e| {
            error!("Failed to load parts: {}", e);
            ServiceError::from(e)
        })?;
        Ok(catalog::run(&parts, &query))
    }

    #[instrument(skip(self))]
    pub async fn suppliers(&self) -> Result<Vec<String>, ServiceError> {
        let parts = self.parts.all().await?;
        Ok(catalog::suppliers(&parts))
    }

    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<CatalogSummary, ServiceError> {
        let parts = self.parts.all().await?;
        Ok(catalog::summarize(&parts))
    }

    #[instrument(skip(self))]
    pub async fn part(&self, code: &str) -> Result<Option<PartRecord>, ServiceError> {
        Ok(self.parts.find(code).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MockDocumentStore, StoreError};
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn page_size_is_clamped_to_maximum() {
        let mut store = MockDocumentStore::new();
        store.expect_get().returning(|_| {
            let parts: serde_json::Map<String, serde_json::Value> = (0..30)
                .map(|i| (format!("P-{i:02}"), serde_json::json!({"stockQty": i})))
                .collect();
            Ok(Some(serde_json::Value::Object(parts)))
        });
        let service = CatalogService::new(Arc::new(PartRepository::new(Arc::new(store), None)), 10);

        let page = service
            .search(CatalogQuery {
                page_size: 500,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.page_size, 10);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.total_pages, 3);
    }

    #[tokio::test]
    async fn store_failure_is_a_remote_error() {
        let mut store = MockDocumentStore::new();
        store
            .expect_get()
            .returning(|_| Err(StoreError::Backend("offline".into())));
        let service = CatalogService::new(Arc::new(PartRepository::new(Arc::new(store), None)), 10);

        assert_matches!(
            service.search(CatalogQuery::default()).await,
            Err(ServiceError::RemoteStoreError(_))
        );
    }
}
