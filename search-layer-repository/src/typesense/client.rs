//! Typesense REST transport.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::{Map, Value};
use tracing::{debug, info};
use url::Url;

use crate::errors::SearchError;
use crate::http::{endpoint, json, send};

/// The Typesense calls used by the adapter. Typesense applies writes
/// before answering, so none of them hand out a job to wait for.
#[async_trait]
pub trait TypesenseClient: Send + Sync {
    /// Fetch a document by id. `Ok(None)` when it does not exist.
    async fn retrieve_document(&self, collection: &str, id: &str)
        -> Result<Option<Value>, SearchError>;

    /// Search a collection. Parameter values are sent as query string values.
    async fn search(&self, collection: &str, params: &Map<String, Value>)
        -> Result<Value, SearchError>;

    /// Create or replace a document. The document carries its own `id`.
    async fn upsert_document(&self, collection: &str, document: Value) -> Result<(), SearchError>;

    /// Delete a document. A missing document is not an error.
    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), SearchError>;

    async fn collection_exists(&self, collection: &str) -> Result<bool, SearchError>;

    async fn create_collection(&self, schema: Value) -> Result<(), SearchError>;

    async fn delete_collection(&self, collection: &str) -> Result<(), SearchError>;
}

/// `TypesenseClient` talking to a Typesense node with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTypesenseClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl HttpTypesenseClient {
    /// Create a client for a single Typesense node.
    ///
    /// # Arguments
    ///
    /// * `url` - The node URL (e.g., "http://localhost:8108")
    /// * `api_key` - An admin API key
    pub fn new(url: &str, api_key: &str) -> Result<Self, SearchError> {
        let base_url = Url::parse(url).map_err(|e| SearchError::config(e.to_string()))?;

        info!(url = %url, "Created Typesense client");

        Ok(Self {
            client: Client::new(),
            base_url,
            api_key: api_key.to_string(),
        })
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, SearchError> {
        let url = endpoint(&self.base_url, segments)?;
        Ok(self
            .client
            .request(method, url)
            .header("X-TYPESENSE-API-KEY", &self.api_key))
    }
}

/// Render search parameters as query string pairs.
fn query_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}

#[async_trait]
impl TypesenseClient for HttpTypesenseClient {
    async fn retrieve_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Value>, SearchError> {
        let request = self.request(Method::GET, &["collections", collection, "documents", id])?;
        let response = send(request, "Retrieve document", &[404]).await?;
        if response.status().as_u16() == 404 {
            debug!(collection = %collection, id = %id, "Document not found");
            return Ok(None);
        }
        Ok(Some(json(response).await?))
    }

    async fn search(
        &self,
        collection: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, SearchError> {
        let request = self.request(Method::GET, &["collections", collection, "documents", "search"])?;
        json(send(request.query(&query_pairs(params)), "Search", &[]).await?).await
    }

    async fn upsert_document(&self, collection: &str, document: Value) -> Result<(), SearchError> {
        let request = self.request(Method::POST, &["collections", collection, "documents"])?;
        send(
            request.query(&[("action", "upsert")]).json(&document),
            "Upsert document",
            &[],
        )
        .await?;
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), SearchError> {
        let request = self.request(Method::DELETE, &["collections", collection, "documents", id])?;
        // 404 is acceptable - document may not exist
        send(request, "Delete document", &[404]).await?;
        Ok(())
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool, SearchError> {
        let request = self.request(Method::GET, &["collections", collection])?;
        let response = send(request, "Retrieve collection", &[404]).await?;
        Ok(response.status().is_success())
    }

    async fn create_collection(&self, schema: Value) -> Result<(), SearchError> {
        let request = self.request(Method::POST, &["collections"])?;
        send(request.json(&schema), "Create collection", &[]).await?;
        Ok(())
    }

    async fn delete_collection(&self, collection: &str) -> Result<(), SearchError> {
        let request = self.request(Method::DELETE, &["collections", collection])?;
        send(request, "Delete collection", &[]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_pairs() {
        let params = json!({ "q": "lamp", "per_page": 5, "query_by": "name,description" });
        let pairs = query_pairs(params.as_object().unwrap());

        assert_eq!(
            pairs,
            vec![
                ("q".to_string(), "lamp".to_string()),
                ("per_page".to_string(), "5".to_string()),
                ("query_by".to_string(), "name,description".to_string()),
            ]
        );
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            HttpTypesenseClient::new("not a url", "key").unwrap_err(),
            SearchError::ConfigError(_)
        ));
    }
}
