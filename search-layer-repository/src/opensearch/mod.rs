//! OpenSearch adapter.
//!
//! Documents keep their nested structure; geo points are stored as
//! `{"lat", "lon"}` objects and text fields that are filterable or sortable
//! get a `raw` keyword sub-field for exact matching.

mod client;
mod indexer;
mod mapping;
#[cfg(test)]
pub(crate) mod mock;
mod schema_manager;
mod searcher;

use std::sync::Arc;

pub use client::{connect, OpenSearchClient};
pub use indexer::OpenSearchIndexer;
pub use mapping::index_body;
pub use schema_manager::OpenSearchSchemaManager;
pub use searcher::OpenSearchSearcher;

use crate::errors::SearchError;
use crate::interfaces::{Adapter, Indexer, QueryCompiler, SchemaManager};
use crate::marshaller::{GeoPointConfig, Marshaller};

/// OpenSearch backend.
pub struct OpenSearchAdapter {
    schema_manager: Arc<OpenSearchSchemaManager>,
    indexer: Arc<OpenSearchIndexer>,
    searcher: Arc<OpenSearchSearcher>,
}

impl OpenSearchAdapter {
    /// Create an adapter over an existing client.
    pub fn new(client: Arc<dyn OpenSearchClient>) -> Self {
        let marshaller = Marshaller::new().with_geo_point(GeoPointConfig::keys("lat", "lon"));

        Self {
            schema_manager: Arc::new(OpenSearchSchemaManager::new(client.clone())),
            indexer: Arc::new(OpenSearchIndexer::new(client.clone(), marshaller.clone())),
            searcher: Arc::new(OpenSearchSearcher::new(client, marshaller)),
        }
    }

    /// Connect to a single OpenSearch node.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `credentials` - Optional basic auth user and password
    pub fn connect(url: &str, credentials: Option<(String, String)>) -> Result<Self, SearchError> {
        let client = connect(url, credentials)?;
        Ok(Self::new(Arc::new(client)))
    }
}

impl Adapter for OpenSearchAdapter {
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
