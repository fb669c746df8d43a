//! OpenSearch index lifecycle.

use std::sync::Arc;

use async_trait::async_trait;
use search_layer_shared::Index;
use tracing::info;

use crate::errors::SearchError;
use crate::interfaces::SchemaManager;
use crate::opensearch::client::OpenSearchClient;
use crate::opensearch::mapping::index_body;
use crate::task::Task;
use crate::types::TaskOptions;

/// Creates and drops OpenSearch indexes with a strict mapping.
///
/// Index creation and deletion are acknowledged synchronously by
/// OpenSearch, so the returned tasks are already complete.
pub struct OpenSearchSchemaManager {
    client: Arc<dyn OpenSearchClient>,
}

impl OpenSearchSchemaManager {
    pub fn new(client: Arc<dyn OpenSearchClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SchemaManager for OpenSearchSchemaManager {
    async fn exists_index(&self, index: &Index) -> Result<bool, SearchError> {
        self.client.index_exists(&index.name).await
    }

    async fn create_index(
        &self,
        index: &Index,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        self.client
            .create_index(&index.name, index_body(index))
            .await?;
        info!(index = %index.name, "Index created");

        Ok(options.return_slow_promise_result.then(Task::completed))
    }

    async fn drop_index(
        &self,
        index: &Index,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        self.client.delete_index(&index.name).await?;
        info!(index = %index.name, "Index dropped");

        Ok(options.return_slow_promise_result.then(Task::completed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opensearch::mock::MockOpenSearchClient;
    use search_layer_shared::Field;

    fn index() -> Index {
        Index::new("blog", vec![Field::identifier("id"), Field::text("title")]).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_drop_index() {
        let client = Arc::new(MockOpenSearchClient::new());
        let manager = OpenSearchSchemaManager::new(client.clone());
        let index = index();

        assert!(!manager.exists_index(&index).await.unwrap());

        let task = manager
            .create_index(&index, TaskOptions::default())
            .await
            .unwrap();
        assert!(task.is_none());
        assert!(manager.exists_index(&index).await.unwrap());

        let created = client.created.lock().await;
        assert_eq!(created[0].0, "blog");
        assert_eq!(created[0].1, index_body(&index));
        drop(created);

        let task = manager.drop_index(&index, TaskOptions::wait()).await.unwrap();
        task.unwrap().wait().await.unwrap();
        assert!(!manager.exists_index(&index).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_existing_index_fails() {
        let client = Arc::new(MockOpenSearchClient::new());
        let manager = OpenSearchSchemaManager::new(client);
        let index = index();

        let _ = manager.create_index(&index, TaskOptions::default()).await.unwrap();
        let result = manager.create_index(&index, TaskOptions::default()).await;

        assert!(matches!(result.unwrap_err(), SearchError::BackendError(_)));
    }
}
