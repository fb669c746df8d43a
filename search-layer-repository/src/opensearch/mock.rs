//! In-memory `OpenSearchClient` double recording every request.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::errors::SearchError;
use crate::opensearch::client::OpenSearchClient;

pub(crate) struct MockOpenSearchClient {
    pub documents: Arc<Mutex<HashMap<(String, String), Value>>>,
    pub indices: Arc<Mutex<HashSet<String>>>,
    pub created: Arc<Mutex<Vec<(String, Value)>>>,
    pub search_requests: Arc<Mutex<Vec<(String, Value)>>>,
    pub refreshes: Arc<Mutex<Vec<bool>>>,
    search_response: Arc<Mutex<Value>>,
}

impl MockOpenSearchClient {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(Mutex::new(HashMap::new())),
            indices: Arc::new(Mutex::new(HashSet::new())),
            created: Arc::new(Mutex::new(Vec::new())),
            search_requests: Arc::new(Mutex::new(Vec::new())),
            refreshes: Arc::new(Mutex::new(Vec::new())),
            search_response: Arc::new(Mutex::new(json!({
                "hits": { "total": { "value": 0 }, "hits": [] }
            }))),
        }
    }

    pub async fn set_search_response(&self, response: Value) {
        *self.search_response.lock().await = response;
    }

    pub async fn insert_document(&self, index: &str, id: &str, source: Value) {
        self.documents.lock().await.insert(
            (index.to_string(), id.to_string()),
            json!({ "_index": index, "_id": id, "found": true, "_source": source }),
        );
    }
}

#[async_trait]
impl OpenSearchClient for MockOpenSearchClient {
    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>, SearchError> {
        let documents = self.documents.lock().await;
        Ok(documents.get(&(index.to_string(), id.to_string())).cloned())
    }

    async fn search(&self, index: &str, body: Value) -> Result<Value, SearchError> {
        self.search_requests
            .lock()
            .await
            .push((index.to_string(), body));
        Ok(self.search_response.lock().await.clone())
    }

    async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        Ok(self.indices.lock().await.contains(index))
    }

    async fn create_index(&self, index: &str, body: Value) -> Result<(), SearchError> {
        if !self.indices.lock().await.insert(index.to_string()) {
            return Err(SearchError::backend(format!(
                "resource_already_exists_exception: {}",
                index
            )));
        }
        self.created.lock().await.push((index.to_string(), body));
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<(), SearchError> {
        if !self.indices.lock().await.remove(index) {
            return Err(SearchError::backend(format!("index_not_found_exception: {}", index)));
        }
        self.documents
            .lock()
            .await
            .retain(|(document_index, _), _| document_index != index);
        Ok(())
    }

    async fn put_document(
        &self,
        index: &str,
        id: &str,
        body: Value,
        refresh: bool,
    ) -> Result<(), SearchError> {
        self.refreshes.lock().await.push(refresh);
        self.insert_document(index, id, body).await;
        Ok(())
    }

    async fn delete_document(
        &self,
        index: &str,
        id: &str,
        refresh: bool,
    ) -> Result<(), SearchError> {
        self.refreshes.lock().await.push(refresh);
        self.documents
            .lock()
            .await
            .remove(&(index.to_string(), id.to_string()));
        Ok(())
    }
}
