//! Document write contract.

use async_trait::async_trait;
use search_layer_shared::{Document, Index};

use crate::errors::SearchError;
use crate::task::Task;
use crate::types::TaskOptions;

/// Writes documents to a backend index.
#[async_trait]
pub trait Indexer: Send + Sync {
    /// Save a document, replacing any document with the same identifier.
    ///
    /// # Arguments
    ///
    /// * `index` - The target index
    /// * `document` - The document, conforming to the index's field tree
    /// * `options` - Whether to return an awaitable task
    ///
    /// # Returns
    ///
    /// * `Ok(Option<Task>)` - The pending write when requested
    /// * `Err(SearchError)` - If the document cannot be marshalled or the backend fails
    async fn save(
        &self,
        index: &Index,
        document: Document,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError>;

    /// Delete a document by identifier. Deleting a missing document succeeds.
    async fn delete(
        &self,
        index: &Index,
        identifier: &str,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError>;
}
