//! Algolia adapter.
//!
//! Records keep their nested structure with geo points moved to Algolia's
//! `_geoloc` attribute and dates stored as Unix timestamps so numeric
//! filters work on them. Writes are queued by Algolia; tasks poll the job
//! status until it is published.

mod client;
mod indexer;
#[cfg(test)]
pub(crate) mod mock;
mod schema_manager;
mod searcher;
mod settings;

use std::sync::Arc;

pub use client::{wait_for_task, AlgoliaClient, HttpAlgoliaClient, TaskId};
pub use indexer::AlgoliaIndexer;
pub use schema_manager::AlgoliaSchemaManager;
pub use searcher::{AlgoliaQuery, AlgoliaSearcher};
pub use settings::{index_settings, replica_name};

use crate::interfaces::{Adapter, Indexer, QueryCompiler, SchemaManager};
use crate::marshaller::{GeoPointConfig, Marshaller};

/// Algolia backend.
pub struct AlgoliaAdapter {
    schema_manager: Arc<AlgoliaSchemaManager>,
    indexer: Arc<AlgoliaIndexer>,
    searcher: Arc<AlgoliaSearcher>,
}

impl AlgoliaAdapter {
    pub fn new(client: Arc<dyn AlgoliaClient>) -> Self {
        let marshaller = Marshaller::new()
            .with_date_as_integer(true)
            .with_geo_point(GeoPointConfig::keys("lat", "lng").renamed("_geoloc"));

        Self {
            schema_manager: Arc::new(AlgoliaSchemaManager::new(client.clone())),
            indexer: Arc::new(AlgoliaIndexer::new(client.clone(), marshaller.clone())),
            searcher: Arc::new(AlgoliaSearcher::new(client, marshaller)),
        }
    }
}

impl Adapter for AlgoliaAdapter {
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
