//! Index lifecycle contract.

use async_trait::async_trait;
use search_layer_shared::Index;

use crate::errors::SearchError;
use crate::task::Task;
use crate::types::TaskOptions;

/// Creates, inspects and drops backend indexes.
///
/// Mutating operations return `Some(Task)` only when
/// `options.return_slow_promise_result` is set.
#[async_trait]
pub trait SchemaManager: Send + Sync {
    /// Check whether the backend index exists.
    async fn exists_index(&self, index: &Index) -> Result<bool, SearchError>;

    /// Create the backend index from the index's field tree.
    async fn create_index(
        &self,
        index: &Index,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError>;

    /// Drop the backend index and every document in it.
    async fn drop_index(
        &self,
        index: &Index,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError>;
}
