use crate::models::{ExtractedProperty, NewsArticle, ScrapedPropertyRow};
use crate::store::{insert_as, Store, StoreResult, Table};
use std::sync::Arc;
use tracing::debug;

/// Writes normalized records, one insert per record.
///
/// There is no transaction across records: a batch that fails halfway keeps
/// whatever was already written. Store errors are returned unchanged.
#[derive(Clone)]
pub struct Persister {
    store: Arc<dyn Store>,
}

impl Persister {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn save_property(
        &self,
        source_id: Option<&str>,
        property: &ExtractedProperty,
    ) -> StoreResult<ScrapedPropertyRow> {
        let row = ScrapedPropertyRow::new(source_id, property);
        let stored: ScrapedPropertyRow =
            insert_as(self.store.as_ref(), Table::ScrapedProperties, &row).await?;
        debug!(external_id = %stored.external_id, "saved scraped property");
        Ok(stored)
    }

    pub async fn save_article(&self, article: &NewsArticle) -> StoreResult<NewsArticle> {
        let stored: NewsArticle = insert_as(self.store.as_ref(), Table::NewsArticles, article).await?;
        debug!(url = %stored.original_url, "saved news article");
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawListing;
    use crate::scrapers::Extractor;
    use crate::store::{MemoryStore, StoreError};

    fn listing() -> ExtractedProperty {
        Extractor::default()
            .extract(&RawListing::from_text(
                "Villa for sale in Palm Jumeirah\nPrice: 12,500,000 AED\n5 bedrooms",
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn saves_row_with_status_new() {
        let store = Arc::new(MemoryStore::new());
        let persister = Persister::new(store.clone());

        let row = persister.save_property(Some("src-1"), &listing()).await.unwrap();

        assert!(row.id.is_some());
        assert_eq!(row.status, "new");
        let rows = store.rows(Table::ScrapedProperties);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["source_id"], "src-1");
        assert_eq!(rows[0]["price"], 12_500_000);
        assert_eq!(rows[0]["purpose"], "sale");
    }

    #[tokio::test]
    async fn store_errors_pass_through() {
        let store = Arc::new(MemoryStore::new().fail_inserts_into(Table::ScrapedProperties));
        let persister = Persister::new(store);

        let err = persister.save_property(None, &listing()).await.unwrap_err();
        assert!(matches!(err, StoreError::Api { status: 500, .. }));
    }
}
