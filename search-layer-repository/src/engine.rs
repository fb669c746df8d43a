//! Engine implementation.
//!
//! An [`Engine`] binds a [`Schema`] to one backend [`Adapter`]. It is the
//! high-level API application code uses to manage indexes, write documents
//! and run searches; index names are resolved against the schema before
//! anything reaches the backend.

use std::sync::Arc;

use futures::future::try_join_all;
use search_layer_shared::{Condition, Document, Index, Schema, Search, SearchBuilder};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::errors::SearchError;
use crate::interfaces::Adapter;
use crate::task::Task;
use crate::types::{BatchOperationSummary, DocumentOperation, SearchResult, TaskOptions};
use crate::utils::document_identifier;

/// A schema served by one backend adapter.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use search_layer_repository::memory::MemoryAdapter;
/// use search_layer_repository::{Engine, TaskOptions};
/// use search_layer_shared::{Condition, Field, Index, Schema};
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let schema = Schema::new(vec![Index::new(
///     "blog",
///     vec![Field::identifier("id"), Field::text("title")],
/// )?])?;
/// let engine = Engine::new(Arc::new(MemoryAdapter::new()), Arc::new(schema));
///
/// engine.create_schema(TaskOptions::wait()).await?;
///
/// let document = json!({ "id": "1", "title": "Hello" });
/// engine
///     .save_document("blog", document.as_object().cloned().unwrap(), TaskOptions::default())
///     .await?;
///
/// let search = engine
///     .search_builder()
///     .index("blog")
///     .add_filter(Condition::search("hello"))
///     .build()?;
/// assert_eq!(engine.search(&search).await?.total(), Some(1));
/// # Ok(())
/// # }
/// ```
pub struct Engine {
    adapter: Arc<dyn Adapter>,
    schema: Arc<Schema>,
    config: EngineConfig,
}

impl Engine {
    /// Create an engine with the default configuration.
    pub fn new(adapter: Arc<dyn Adapter>, schema: Arc<Schema>) -> Self {
        Self::with_config(adapter, schema, EngineConfig::default())
    }

    /// Create an engine with a custom configuration.
    ///
    /// # Arguments
    ///
    /// * `adapter` - The backend the engine delegates to
    /// * `schema` - The indexes the engine serves
    /// * `config` - Engine limits such as the bulk batch size
    pub fn with_config(adapter: Arc<dyn Adapter>, schema: Arc<Schema>, config: EngineConfig) -> Self {
        Self {
            adapter,
            schema,
            config,
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn adapter(&self) -> Arc<dyn Adapter> {
        self.adapter.clone()
    }

    /// Start a search request against this engine's schema.
    pub fn search_builder(&self) -> SearchBuilder {
        SearchBuilder::new(self.schema.clone())
    }

    fn index(&self, name: &str) -> Result<Arc<Index>, SearchError> {
        self.schema
            .index(name)
            .ok_or_else(|| SearchError::unknown_index(name))
    }

    fn validate_batch_size(&self, size: usize) -> Result<(), SearchError> {
        if let Some(max) = self.config.max_batch_size {
            if size > max {
                return Err(SearchError::batch_size_exceeded(size, max));
            }
        }
        Ok(())
    }

    /// Run a search.
    ///
    /// The request must have been built against an index of this engine's
    /// schema.
    ///
    /// # Returns
    ///
    /// * `Ok(SearchResult)` - The lazily unmarshalled page and the total, if known
    /// * `Err(SearchError::UnknownIndex)` - If the request targets an index this engine does not serve
    /// * `Err(SearchError)` - If the backend cannot express or execute the request
    pub async fn search(&self, search: &Search) -> Result<SearchResult, SearchError> {
        if self.schema.index(&search.index.name).as_deref() != Some(search.index.as_ref()) {
            return Err(SearchError::unknown_index(&search.index.name));
        }

        self.adapter.searcher().search(search).await
    }

    /// Save a document, creating it or replacing the stored one with the same
    /// identifier.
    ///
    /// # Arguments
    ///
    /// * `index` - Name of the target index
    /// * `document` - The document, conforming to the index's field tree
    /// * `options` - Whether to return an awaitable task
    pub async fn save_document(
        &self,
        index: &str,
        document: Document,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        let index = self.index(index)?;
        self.adapter.indexer().save(&index, document, options).await
    }

    /// Delete a document. Deleting a missing document succeeds.
    pub async fn delete_document(
        &self,
        index: &str,
        identifier: &str,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        let index = self.index(index)?;
        self.adapter.indexer().delete(&index, identifier, options).await
    }

    /// Load a single document by identifier.
    ///
    /// # Returns
    ///
    /// * `Ok(Document)` - The stored document
    /// * `Err(SearchError::DocumentNotFound)` - If no document has this identifier
    /// * `Err(SearchError)` - If the lookup fails
    pub async fn get_document(&self, index: &str, identifier: &str) -> Result<Document, SearchError> {
        let search = self
            .search_builder()
            .index(index)
            .add_filter(Condition::identifier(identifier))
            .limit(1)
            .build()
            .map_err(|e| match e {
                search_layer_shared::SchemaError::UnknownIndex(name) => SearchError::unknown_index(name),
                e => SearchError::from(e),
            })?;

        match self.adapter.searcher().search(&search).await?.next() {
            Some(document) => document,
            None => Err(SearchError::document_not_found(index, identifier)),
        }
    }

    /// Save and delete documents in one call and return a summary of
    /// successful and failed operations.
    ///
    /// Saves are applied before deletes. An operation failing, e.g. a
    /// document that cannot be marshalled, does not stop the others.
    ///
    /// # Arguments
    ///
    /// * `index` - Name of the target index
    /// * `saves` - Documents to save
    /// * `deletes` - Identifiers of documents to delete
    /// * `options` - When set, each operation's task is awaited before it is reported
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Counts and individual results in operation order
    /// * `Err(SearchError::BatchSizeExceeded)` - If the batch exceeds the configured maximum
    /// * `Err(SearchError::UnknownIndex)` - If the index is not part of the schema
    pub async fn bulk(
        &self,
        index: &str,
        saves: Vec<Document>,
        deletes: Vec<String>,
        options: TaskOptions,
    ) -> Result<BatchOperationSummary, SearchError> {
        let operations = saves
            .into_iter()
            .map(DocumentOperation::Save)
            .chain(deletes.into_iter().map(DocumentOperation::Delete))
            .collect();

        self.bulk_operations(index, operations, options).await
    }

    /// Apply a sequence of mixed operations in order. See [`Engine::bulk`].
    pub async fn bulk_operations(
        &self,
        index: &str,
        operations: Vec<DocumentOperation>,
        options: TaskOptions,
    ) -> Result<BatchOperationSummary, SearchError> {
        let index = self.index(index)?;
        if operations.is_empty() {
            return Ok(BatchOperationSummary::default());
        }
        self.validate_batch_size(operations.len())?;

        let indexer = self.adapter.indexer();
        let mut summary = BatchOperationSummary::default();

        for operation in operations {
            let (identifier, outcome) = match operation {
                DocumentOperation::Save(document) => {
                    let identifier = document_identifier(&index, &document).ok();
                    (identifier, indexer.save(&index, document, options).await)
                }
                DocumentOperation::Delete(identifier) => {
                    let outcome = indexer.delete(&index, &identifier, options).await;
                    (Some(identifier), outcome)
                }
            };

            let outcome = match outcome {
                Ok(Some(task)) => task.wait().await,
                Ok(None) => Ok(()),
                Err(e) => Err(e),
            };
            if let Err(e) = &outcome {
                warn!(index = %index.name, identifier = ?identifier, error = %e, "Bulk operation failed");
            }
            summary.record(identifier, outcome);
        }

        debug!(
            index = %index.name,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Applied bulk operations"
        );
        Ok(summary)
    }

    pub async fn exists_index(&self, index: &str) -> Result<bool, SearchError> {
        let index = self.index(index)?;
        self.adapter.schema_manager().exists_index(&index).await
    }

    pub async fn create_index(
        &self,
        index: &str,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        let index = self.index(index)?;
        info!(index = %index.name, "Creating index");
        self.adapter.schema_manager().create_index(&index, options).await
    }

    pub async fn drop_index(
        &self,
        index: &str,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        let index = self.index(index)?;
        info!(index = %index.name, "Dropping index");
        self.adapter.schema_manager().drop_index(&index, options).await
    }

    /// Create every index of the schema.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Task))` - A task joining every index creation, when requested
    /// * `Ok(None)` - If no task was requested
    /// * `Err(SearchError)` - The first failing creation
    pub async fn create_schema(&self, options: TaskOptions) -> Result<Option<Task>, SearchError> {
        let schema_manager = self.adapter.schema_manager();
        let tasks = try_join_all(
            self.schema
                .indexes()
                .map(|index| schema_manager.create_index(index, options)),
        )
        .await?;
        info!(indexes = self.schema.len(), "Created schema");

        Ok(join_tasks(tasks, options))
    }

    /// Drop every index of the schema.
    pub async fn drop_schema(&self, options: TaskOptions) -> Result<Option<Task>, SearchError> {
        let schema_manager = self.adapter.schema_manager();
        let tasks = try_join_all(
            self.schema
                .indexes()
                .map(|index| schema_manager.drop_index(index, options)),
        )
        .await?;
        info!(indexes = self.schema.len(), "Dropped schema");

        Ok(join_tasks(tasks, options))
    }
}

fn join_tasks(tasks: Vec<Option<Task>>, options: TaskOptions) -> Option<Task> {
    options
        .return_slow_promise_result
        .then(|| Task::join(tasks.into_iter().flatten().collect()))
}
