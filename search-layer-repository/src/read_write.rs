//! Read/write split adapter.

use std::sync::Arc;

use crate::interfaces::{Adapter, Indexer, QueryCompiler, SchemaManager};

/// Routes searches to one adapter and every mutation, document writes as
/// well as index lifecycle, to another.
///
/// Typical use is searching a replica while writing to the primary, or
/// searching the old backend while a new one is being filled.
pub struct ReadWriteAdapter {
    read: Arc<dyn Adapter>,
    write: Arc<dyn Adapter>,
}

impl ReadWriteAdapter {
    pub fn new(read: Arc<dyn Adapter>, write: Arc<dyn Adapter>) -> Self {
        Self { read, write }
    }
}

impl Adapter for ReadWriteAdapter {
    fn schema_manager(&self) -> Arc<dyn SchemaManager> {
        self.write.schema_manager()
    }

    fn indexer(&self) -> Arc<dyn Indexer> {
        self.write.indexer()
    }

    fn searcher(&self) -> Arc<dyn QueryCompiler> {
        self.read.searcher()
    }
}
