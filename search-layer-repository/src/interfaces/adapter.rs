//! Backend adapter bundle.

use std::sync::Arc;

use crate::interfaces::{Indexer, QueryCompiler, SchemaManager};

/// A backend: the three contracts an engine delegates to.
///
/// Implementations hand out shared handles so composite adapters can fan
/// out to, or route between, the parts of several backends.
pub trait Adapter: Send + Sync {
    fn schema_manager(&self) -> Arc<dyn SchemaManager>;

    fn indexer(&self) -> Arc<dyn Indexer>;

    fn searcher(&self) -> Arc<dyn QueryCompiler>;
}
