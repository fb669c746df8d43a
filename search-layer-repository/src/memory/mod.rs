//! Memory adapter.
//!
//! A reference backend evaluating the whole condition algebra in process.
//! Documents are stored flattened (dates as Unix timestamps) the way a
//! backend without nested objects would index them, so filters address
//! nested values by their dotted path.

mod evaluate;
mod indexer;
mod schema_manager;
mod searcher;
mod store;

use std::sync::Arc;

pub use indexer::MemoryIndexer;
pub use schema_manager::MemorySchemaManager;
pub use searcher::MemorySearcher;
pub use store::MemoryStore;

use crate::interfaces::{Adapter, Indexer, QueryCompiler, SchemaManager};
use crate::marshaller::FlattenMarshaller;

/// In process backend.
pub struct MemoryAdapter {
    store: Arc<MemoryStore>,
    schema_manager: Arc<MemorySchemaManager>,
    indexer: Arc<MemoryIndexer>,
    searcher: Arc<MemorySearcher>,
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// Create an adapter over an existing store, e.g. to share it between
    /// engines.
    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        let marshaller = FlattenMarshaller::new().with_date_as_integer(true);

        Self {
            schema_manager: Arc::new(MemorySchemaManager::new(store.clone())),
            indexer: Arc::new(MemoryIndexer::new(store.clone(), marshaller.clone())),
            searcher: Arc::new(MemorySearcher::new(store.clone(), marshaller)),
            store,
        }
    }

    pub fn store(&self) -> Arc<MemoryStore> {
        self.store.clone()
    }
}

impl Adapter for MemoryAdapter {
    fn schema_manager(&self) -> Arc<dyn SchemaManager> {
        self.schema_manager.clone()
    }

    fn indexer(&self) -> Arc<dyn Indexer> {
        self.indexer.clone()
    }

    fn searcher(&self) -> Arc<dyn QueryCompiler> {
        self.searcher.clone()
    }
}
