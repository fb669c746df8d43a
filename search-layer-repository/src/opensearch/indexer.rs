//! OpenSearch document writes.

use std::sync::Arc;

use async_trait::async_trait;
use search_layer_shared::{Document, Index};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::errors::SearchError;
use crate::interfaces::Indexer;
use crate::marshaller::Marshaller;
use crate::opensearch::client::OpenSearchClient;
use crate::task::Task;
use crate::types::TaskOptions;
use crate::utils::document_identifier;

/// Writes marshalled documents to OpenSearch.
///
/// When a task is requested the write is sent with `refresh=wait_for`, so
/// the document is searchable once the call returns and the task handed
/// back is already complete.
pub struct OpenSearchIndexer {
    client: Arc<dyn OpenSearchClient>,
    marshaller: Marshaller,
}

impl OpenSearchIndexer {
    pub fn new(client: Arc<dyn OpenSearchClient>, marshaller: Marshaller) -> Self {
        Self { client, marshaller }
    }
}

#[async_trait]
impl Indexer for OpenSearchIndexer {
    #[instrument(skip(self, index, document, options), fields(index = %index.name))]
    async fn save(
        &self,
        index: &Index,
        document: Document,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        let identifier = document_identifier(index, &document)?;
        let body = self.marshaller.marshall(&index.fields, &document)?;

        self.client
            .put_document(
                &index.name,
                &identifier,
                Value::Object(body),
                options.return_slow_promise_result,
            )
            .await?;
        debug!(identifier = %identifier, "Saved document");

        Ok(options.return_slow_promise_result.then(Task::completed))
    }

    #[instrument(skip(self, index, options), fields(index = %index.name))]
    async fn delete(
        &self,
        index: &Index,
        identifier: &str,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        self.client
            .delete_document(&index.name, identifier, options.return_slow_promise_result)
            .await?;

        Ok(options.return_slow_promise_result.then(Task::completed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshaller::GeoPointConfig;
    use crate::opensearch::mock::MockOpenSearchClient;
    use search_layer_shared::Field;
    use serde_json::json;

    fn index() -> Index {
        Index::new(
            "places",
            vec![
                Field::identifier("id"),
                Field::text("name"),
                Field::geo_point("location").filterable(true),
            ],
        )
        .unwrap()
    }

    fn indexer(client: Arc<MockOpenSearchClient>) -> OpenSearchIndexer {
        OpenSearchIndexer::new(
            client,
            Marshaller::new().with_geo_point(GeoPointConfig::keys("lat", "lon")),
        )
    }

    #[tokio::test]
    async fn test_save_marshalls_document() {
        let client = Arc::new(MockOpenSearchClient::new());
        let indexer = indexer(client.clone());

        let document = json!({
            "id": "paris",
            "name": "Paris",
            "location": { "latitude": 48.85, "longitude": 2.35 },
        });
        let task = indexer
            .save(&index(), document.as_object().cloned().unwrap(), TaskOptions::default())
            .await
            .unwrap();
        assert!(task.is_none());

        let documents = client.documents.lock().await;
        let stored = &documents[&("places".to_string(), "paris".to_string())];
        assert_eq!(stored["_source"]["location"], json!({ "lat": 48.85, "lon": 2.35 }));
        assert_eq!(*client.refreshes.lock().await, vec![false]);
    }

    #[tokio::test]
    async fn test_save_with_task_refreshes() {
        let client = Arc::new(MockOpenSearchClient::new());
        let indexer = indexer(client.clone());

        let document = json!({ "id": 7, "name": "Lyon" });
        let task = indexer
            .save(&index(), document.as_object().cloned().unwrap(), TaskOptions::wait())
            .await
            .unwrap();

        task.unwrap().wait().await.unwrap();
        assert_eq!(*client.refreshes.lock().await, vec![true]);
        assert!(client
            .documents
            .lock()
            .await
            .contains_key(&("places".to_string(), "7".to_string())));
    }

    #[tokio::test]
    async fn test_save_without_identifier() {
        let client = Arc::new(MockOpenSearchClient::new());
        let indexer = indexer(client.clone());

        let document = json!({ "name": "Nowhere" });
        let result = indexer
            .save(&index(), document.as_object().cloned().unwrap(), TaskOptions::default())
            .await;

        assert!(matches!(result.unwrap_err(), SearchError::ValidationError(_)));
        assert!(client.documents.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_document() {
        let client = Arc::new(MockOpenSearchClient::new());
        let indexer = indexer(client);

        let task = indexer
            .delete(&index(), "missing", TaskOptions::wait())
            .await
            .unwrap();
        assert!(task.unwrap().wait().await.is_ok());
    }
}
