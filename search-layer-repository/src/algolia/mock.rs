//! In-memory `AlgoliaClient` double recording every request.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::algolia::client::{AlgoliaClient, TaskId};
use crate::errors::SearchError;

pub(crate) struct MockAlgoliaClient {
    pub records: Arc<Mutex<HashMap<(String, String), Value>>>,
    pub settings: Arc<Mutex<BTreeMap<String, Value>>>,
    pub search_requests: Arc<Mutex<Vec<(String, Value)>>>,
    pub deleted_indexes: Arc<Mutex<Vec<String>>>,
    pub polls: Arc<Mutex<usize>>,
    pending_polls: Arc<Mutex<usize>>,
    search_response: Arc<Mutex<Value>>,
    next_task: Arc<Mutex<TaskId>>,
}

impl MockAlgoliaClient {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            settings: Arc::new(Mutex::new(BTreeMap::new())),
            search_requests: Arc::new(Mutex::new(Vec::new())),
            deleted_indexes: Arc::new(Mutex::new(Vec::new())),
            polls: Arc::new(Mutex::new(0)),
            pending_polls: Arc::new(Mutex::new(0)),
            search_response: Arc::new(Mutex::new(json!({ "hits": [], "nbHits": 0 }))),
            next_task: Arc::new(Mutex::new(0)),
        }
    }

    /// Number of status polls answered with `notPublished` before a task
    /// is reported as published.
    pub async fn set_pending_polls(&self, pending: usize) {
        *self.pending_polls.lock().await = pending;
    }

    pub async fn set_search_response(&self, response: Value) {
        *self.search_response.lock().await = response;
    }

    async fn task(&self) -> TaskId {
        let mut next = self.next_task.lock().await;
        *next += 1;
        *next
    }
}

#[async_trait]
impl AlgoliaClient for MockAlgoliaClient {
    async fn get_object(&self, index: &str, object_id: &str) -> Result<Option<Value>, SearchError> {
        let records = self.records.lock().await;
        Ok(records
            .get(&(index.to_string(), object_id.to_string()))
            .cloned())
    }

    async fn search_single_index(&self, index: &str, params: Value) -> Result<Value, SearchError> {
        self.search_requests
            .lock()
            .await
            .push((index.to_string(), params));
        Ok(self.search_response.lock().await.clone())
    }

    async fn save_object(
        &self,
        index: &str,
        object_id: &str,
        record: Value,
    ) -> Result<TaskId, SearchError> {
        self.records
            .lock()
            .await
            .insert((index.to_string(), object_id.to_string()), record);
        Ok(self.task().await)
    }

    async fn delete_object(&self, index: &str, object_id: &str) -> Result<TaskId, SearchError> {
        self.records
            .lock()
            .await
            .remove(&(index.to_string(), object_id.to_string()));
        Ok(self.task().await)
    }

    async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        Ok(self.settings.lock().await.contains_key(index))
    }

    async fn set_settings(&self, index: &str, settings: Value) -> Result<TaskId, SearchError> {
        self.settings
            .lock()
            .await
            .insert(index.to_string(), settings);
        Ok(self.task().await)
    }

    async fn delete_index(&self, index: &str) -> Result<TaskId, SearchError> {
        self.settings.lock().await.remove(index);
        self.deleted_indexes.lock().await.push(index.to_string());
        Ok(self.task().await)
    }

    async fn task_published(&self, _index: &str, _task_id: TaskId) -> Result<bool, SearchError> {
        *self.polls.lock().await += 1;
        let mut pending = self.pending_polls.lock().await;
        if *pending == 0 {
            return Ok(true);
        }
        *pending = pending.saturating_sub(1);
        Ok(false)
    }
}
