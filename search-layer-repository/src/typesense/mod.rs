//! Typesense adapter.
//!
//! Documents keep their nested structure (collections are created with
//! nested fields enabled), dates are stored as Unix timestamps and geo
//! points as `[lat, lng]` pairs. Typesense only paginates by page, so an
//! offset must be a multiple of the limit.

mod client;
mod indexer;
#[cfg(test)]
pub(crate) mod mock;
mod schema;
mod schema_manager;
mod searcher;

use std::sync::Arc;

pub use client::{HttpTypesenseClient, TypesenseClient};
pub use indexer::TypesenseIndexer;
pub use schema::collection_schema;
pub use schema_manager::TypesenseSchemaManager;
pub use searcher::TypesenseSearcher;

use crate::interfaces::{Adapter, Indexer, QueryCompiler, SchemaManager};
use crate::marshaller::{GeoPointConfig, Marshaller};

/// Typesense backend.
pub struct TypesenseAdapter {
    schema_manager: Arc<TypesenseSchemaManager>,
    indexer: Arc<TypesenseIndexer>,
    searcher: Arc<TypesenseSearcher>,
}

impl TypesenseAdapter {
    pub fn new(client: Arc<dyn TypesenseClient>) -> Self {
        let marshaller = Marshaller::new()
            .with_date_as_integer(true)
            .with_geo_point(GeoPointConfig::positional());

        Self {
            schema_manager: Arc::new(TypesenseSchemaManager::new(client.clone())),
            indexer: Arc::new(TypesenseIndexer::new(client.clone(), marshaller.clone())),
            searcher: Arc::new(TypesenseSearcher::new(client, marshaller)),
        }
    }
}

impl Adapter for TypesenseAdapter {
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
