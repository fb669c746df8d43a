//! Typesense collection lifecycle.

use std::sync::Arc;

use async_trait::async_trait;
use search_layer_shared::Index;
use tracing::info;

use crate::errors::SearchError;
use crate::interfaces::SchemaManager;
use crate::task::Task;
use crate::types::TaskOptions;
use crate::typesense::client::TypesenseClient;
use crate::typesense::schema::collection_schema;

/// Creates and drops one Typesense collection per index.
pub struct TypesenseSchemaManager {
    client: Arc<dyn TypesenseClient>,
}

impl TypesenseSchemaManager {
    pub fn new(client: Arc<dyn TypesenseClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SchemaManager for TypesenseSchemaManager {
    async fn exists_index(&self, index: &Index) -> Result<bool, SearchError> {
        self.client.collection_exists(&index.name).await
    }

    async fn create_index(
        &self,
        index: &Index,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        self.client.create_collection(collection_schema(index)).await?;
        info!(index = %index.name, "Collection created");

        Ok(options.return_slow_promise_result.then(Task::completed))
    }

    async fn drop_index(
        &self,
        index: &Index,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        self.client.delete_collection(&index.name).await?;
        info!(index = %index.name, "Collection dropped");

        Ok(options.return_slow_promise_result.then(Task::completed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typesense::mock::MockTypesenseClient;
    use search_layer_shared::Field;

    #[tokio::test]
    async fn test_collection_lifecycle() {
        let client = Arc::new(MockTypesenseClient::new());
        let manager = TypesenseSchemaManager::new(client.clone());
        let index = Index::new("blog", vec![Field::identifier("id"), Field::text("title")]).unwrap();

        let task = manager.create_index(&index, TaskOptions::wait()).await.unwrap();
        task.unwrap().wait().await.unwrap();
        assert!(manager.exists_index(&index).await.unwrap());
        assert_eq!(
            client.collections.lock().await["blog"],
            collection_schema(&index)
        );

        let task = manager.drop_index(&index, TaskOptions::default()).await.unwrap();
        assert!(task.is_none());
        assert!(!manager.exists_index(&index).await.unwrap());

        let result = manager.drop_index(&index, TaskOptions::default()).await;
        assert!(matches!(result.unwrap_err(), SearchError::BackendError(_)));
    }
}
