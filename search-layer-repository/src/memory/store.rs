//! Shared storage of the memory adapter.

use std::collections::HashMap;

use search_layer_shared::Document;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::errors::SearchError;

/// Flattened records of one index, in insertion order.
#[derive(Debug, Default, Clone)]
pub(crate) struct Records {
    records: Vec<(String, Document)>,
}

impl Records {
    pub fn get(&self, identifier: &str) -> Option<&Document> {
        self.records
            .iter()
            .find(|(id, _)| id == identifier)
            .map(|(_, record)| record)
    }

    /// Insert a record or replace the one stored under the same identifier
    /// in place.
    pub fn upsert(&mut self, identifier: String, record: Document) {
        match self.records.iter_mut().find(|(id, _)| *id == identifier) {
            Some((_, existing)) => *existing = record,
            None => self.records.push((identifier, record)),
        }
    }

    pub fn remove(&mut self, identifier: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|(id, _)| id != identifier);
        before != self.records.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.records.iter().map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Indexes kept in process memory, shared by the memory adapter parts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    indexes: RwLock<HashMap<String, Records>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Records>> {
        self.indexes.read().await
    }

    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Records>> {
        self.indexes.write().await
    }

    /// Number of records stored in an index, `None` if it does not exist.
    pub async fn count(&self, index: &str) -> Option<usize> {
        self.indexes.read().await.get(index).map(Records::len)
    }
}

pub(crate) fn missing_index(index: &str) -> SearchError {
    SearchError::backend(format!("Index \"{}\" does not exist", index))
}
