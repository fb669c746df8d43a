//! Memory index lifecycle.

use std::sync::Arc;

use async_trait::async_trait;
use search_layer_shared::Index;
use tracing::info;

use crate::errors::SearchError;
use crate::interfaces::SchemaManager;
use crate::memory::store::{missing_index, MemoryStore, Records};
use crate::task::Task;
use crate::types::TaskOptions;

pub struct MemorySchemaManager {
    store: Arc<MemoryStore>,
}

impl MemorySchemaManager {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SchemaManager for MemorySchemaManager {
    async fn exists_index(&self, index: &Index) -> Result<bool, SearchError> {
        Ok(self.store.read().await.contains_key(&index.name))
    }

    async fn create_index(
        &self,
        index: &Index,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        let mut indexes = self.store.write().await;
        if indexes.contains_key(&index.name) {
            return Err(SearchError::backend(format!(
                "Index \"{}\" already exists",
                index.name
            )));
        }
        indexes.insert(index.name.clone(), Records::default());
        info!(index = %index.name, "Index created");

        Ok(options.return_slow_promise_result.then(Task::completed))
    }

    async fn drop_index(
        &self,
        index: &Index,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        self.store
            .write()
            .await
            .remove(&index.name)
            .ok_or_else(|| missing_index(&index.name))?;
        info!(index = %index.name, "Index dropped");

        Ok(options.return_slow_promise_result.then(Task::completed))
    }
}
