//! Memory document writes.

use std::sync::Arc;

use async_trait::async_trait;
use search_layer_shared::{Document, Index};
use tracing::debug;

use crate::errors::SearchError;
use crate::interfaces::Indexer;
use crate::marshaller::FlattenMarshaller;
use crate::memory::store::{missing_index, MemoryStore};
use crate::task::Task;
use crate::types::TaskOptions;
use crate::utils::document_identifier;

/// Stores flattened records in a [`MemoryStore`]. Writes are visible as
/// soon as the call returns.
pub struct MemoryIndexer {
    store: Arc<MemoryStore>,
    marshaller: FlattenMarshaller,
}

impl MemoryIndexer {
    pub fn new(store: Arc<MemoryStore>, marshaller: FlattenMarshaller) -> Self {
        Self { store, marshaller }
    }
}

#[async_trait]
impl Indexer for MemoryIndexer {
    async fn save(
        &self,
        index: &Index,
        document: Document,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        let identifier = document_identifier(index, &document)?;
        let record = self.marshaller.marshall(&index.fields, &document)?;

        let mut indexes = self.store.write().await;
        indexes
            .get_mut(&index.name)
            .ok_or_else(|| missing_index(&index.name))?
            .upsert(identifier.clone(), record);
        debug!(index = %index.name, identifier = %identifier, "Saved document");

        Ok(options.return_slow_promise_result.then(Task::completed))
    }

    async fn delete(
        &self,
        index: &Index,
        identifier: &str,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        let mut indexes = self.store.write().await;
        let removed = indexes
            .get_mut(&index.name)
            .ok_or_else(|| missing_index(&index.name))?
            .remove(identifier);
        debug!(index = %index.name, identifier = %identifier, removed, "Deleted document");

        Ok(options.return_slow_promise_result.then(Task::completed))
    }
}
