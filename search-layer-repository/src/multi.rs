//! Fan-out adapter.
//!
//! Sends every operation to a list of named adapters concurrently and merges
//! the outcomes: search hits are concatenated in adapter order, totals are
//! summed, mutations return one task joining the tasks of every adapter.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use search_layer_shared::{Document, Index, Search};
use tracing::{debug, instrument};

use crate::errors::SearchError;
use crate::interfaces::{Adapter, Indexer, QueryCompiler, SchemaManager};
use crate::task::Task;
use crate::types::{SearchResult, TaskOptions};

/// The named adapters a [`MultiAdapter`] fans out to.
struct Fanout {
    adapters: Vec<(String, Arc<dyn Adapter>)>,
}

impl Fanout {
    fn names(&self) -> Vec<&str> {
        self.adapters.iter().map(|(name, _)| name.as_str()).collect()
    }
}

/// Merge the optional tasks of every adapter into one.
fn join_tasks(tasks: Vec<Option<Task>>, options: TaskOptions) -> Option<Task> {
    options
        .return_slow_promise_result
        .then(|| Task::join(tasks.into_iter().flatten().collect()))
}

/// Sum of the totals, unknown as soon as one of them is.
fn merged_total(results: &[SearchResult]) -> Option<u64> {
    results.iter().map(SearchResult::total).sum()
}

/// Adapter fanning out to several others.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use search_layer_repository::interfaces::Adapter;
/// use search_layer_repository::memory::MemoryAdapter;
/// use search_layer_repository::multi::MultiAdapter;
///
/// let primary: Arc<dyn Adapter> = Arc::new(MemoryAdapter::new());
/// let mirror: Arc<dyn Adapter> = Arc::new(MemoryAdapter::new());
/// let multi = MultiAdapter::new(vec![
///     ("primary".to_string(), primary),
///     ("mirror".to_string(), mirror),
/// ]);
/// assert_eq!(multi.names(), vec!["primary", "mirror"]);
/// ```
pub struct MultiAdapter {
    fanout: Arc<Fanout>,
}

impl MultiAdapter {
    pub fn new(adapters: Vec<(String, Arc<dyn Adapter>)>) -> Self {
        Self {
            fanout: Arc::new(Fanout { adapters }),
        }
    }

    /// Names of the inner adapters in fan-out order.
    pub fn names(&self) -> Vec<&str> {
        self.fanout.names()
    }
}

impl Adapter for MultiAdapter {
    fn schema_manager(&self) -> Arc<dyn SchemaManager> {
        self.fanout.clone()
    }

    fn indexer(&self) -> Arc<dyn Indexer> {
        self.fanout.clone()
    }

    fn searcher(&self) -> Arc<dyn QueryCompiler> {
        self.fanout.clone()
    }
}

#[async_trait]
impl QueryCompiler for Fanout {
    #[instrument(skip(self, search), fields(index = %search.index.name))]
    async fn search(&self, search: &Search) -> Result<SearchResult, SearchError> {
        let results = try_join_all(
            self.adapters
                .iter()
                .map(|(_, adapter)| async move { adapter.searcher().search(search).await }),
        )
        .await?;

        let total = merged_total(&results);
        debug!(adapters = ?self.names(), total = ?total, "Merged search results");

        Ok(SearchResult::new(total, results.into_iter().flatten()))
    }
}

#[async_trait]
impl SchemaManager for Fanout {
    async fn exists_index(&self, index: &Index) -> Result<bool, SearchError> {
        let exists = try_join_all(
            self.adapters
                .iter()
                .map(|(_, adapter)| async move { adapter.schema_manager().exists_index(index).await }),
        )
        .await?;

        Ok(exists.into_iter().all(|exists| exists))
    }

    async fn create_index(
        &self,
        index: &Index,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        let tasks = try_join_all(self.adapters.iter().map(|(_, adapter)| async move {
            adapter.schema_manager().create_index(index, options).await
        }))
        .await?;
        debug!(index = %index.name, adapters = ?self.names(), "Created index");

        Ok(join_tasks(tasks, options))
    }

    async fn drop_index(
        &self,
        index: &Index,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        let tasks = try_join_all(self.adapters.iter().map(|(_, adapter)| async move {
            adapter.schema_manager().drop_index(index, options).await
        }))
        .await?;
        debug!(index = %index.name, adapters = ?self.names(), "Dropped index");

        Ok(join_tasks(tasks, options))
    }
}

#[async_trait]
impl Indexer for Fanout {
    async fn save(
        &self,
        index: &Index,
        document: Document,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        let tasks = try_join_all(self.adapters.iter().map(|(_, adapter)| {
            let document = document.clone();
            async move { adapter.indexer().save(index, document, options).await }
        }))
        .await?;

        Ok(join_tasks(tasks, options))
    }

    async fn delete(
        &self,
        index: &Index,
        identifier: &str,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        let tasks = try_join_all(self.adapters.iter().map(|(_, adapter)| async move {
            adapter.indexer().delete(index, identifier, options).await
        }))
        .await?;

        Ok(join_tasks(tasks, options))
    }
}
