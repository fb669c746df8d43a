//! In-memory `TypesenseClient` double recording every request.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;

use crate::errors::SearchError;
use crate::typesense::client::TypesenseClient;

pub(crate) struct MockTypesenseClient {
    pub documents: Arc<Mutex<HashMap<(String, String), Value>>>,
    pub collections: Arc<Mutex<HashMap<String, Value>>>,
    pub search_requests: Arc<Mutex<Vec<(String, Map<String, Value>)>>>,
    search_response: Arc<Mutex<Value>>,
}

impl MockTypesenseClient {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(Mutex::new(HashMap::new())),
            collections: Arc::new(Mutex::new(HashMap::new())),
            search_requests: Arc::new(Mutex::new(Vec::new())),
            search_response: Arc::new(Mutex::new(json!({ "found": 0, "hits": [] }))),
        }
    }

    pub async fn set_search_response(&self, response: Value) {
        *self.search_response.lock().await = response;
    }
}

#[async_trait]
impl TypesenseClient for MockTypesenseClient {
    async fn retrieve_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Value>, SearchError> {
        let documents = self.documents.lock().await;
        Ok(documents
            .get(&(collection.to_string(), id.to_string()))
            .cloned())
    }

    async fn search(
        &self,
        collection: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, SearchError> {
        self.search_requests
            .lock()
            .await
            .push((collection.to_string(), params.clone()));
        Ok(self.search_response.lock().await.clone())
    }

    async fn upsert_document(&self, collection: &str, document: Value) -> Result<(), SearchError> {
        let id = document
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| SearchError::backend("Document has no string id"))?
            .to_string();
        self.documents
            .lock()
            .await
            .insert((collection.to_string(), id), document);
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), SearchError> {
        self.documents
            .lock()
            .await
            .remove(&(collection.to_string(), id.to_string()));
        Ok(())
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool, SearchError> {
        Ok(self.collections.lock().await.contains_key(collection))
    }

    async fn create_collection(&self, schema: Value) -> Result<(), SearchError> {
        let name = schema
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| SearchError::backend("Collection schema has no name"))?
            .to_string();
        self.collections.lock().await.insert(name, schema);
        Ok(())
    }

    async fn delete_collection(&self, collection: &str) -> Result<(), SearchError> {
        self.collections
            .lock()
            .await
            .remove(collection)
            .map(|_| ())
            .ok_or_else(|| SearchError::backend(format!("Not found: {}", collection)))
    }
}
