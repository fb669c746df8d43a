//! OpenSearch transport.
//!
//! [`OpenSearchClient`] is the narrow set of HTTP calls the adapter needs.
//! It is implemented for the `opensearch` crate's client; tests substitute
//! an in-memory double.

use async_trait::async_trait;
use opensearch::{
    auth::Credentials,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    http::response::Response,
    indices::{IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts},
    params::Refresh,
    DeleteParts, GetParts, IndexParts, OpenSearch, SearchParts,
};
use serde_json::Value;
use tracing::{debug, error, info};
use url::Url;

use crate::errors::SearchError;

/// The OpenSearch calls used by the adapter.
#[async_trait]
pub trait OpenSearchClient: Send + Sync {
    /// Fetch a single document. `Ok(None)` when it does not exist.
    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>, SearchError>;

    /// Run a search request and return the raw response body.
    async fn search(&self, index: &str, body: Value) -> Result<Value, SearchError>;

    async fn index_exists(&self, index: &str) -> Result<bool, SearchError>;

    async fn create_index(&self, index: &str, body: Value) -> Result<(), SearchError>;

    async fn delete_index(&self, index: &str) -> Result<(), SearchError>;

    /// Index a document under `id`. With `refresh` the call returns once the
    /// document is visible to searches.
    async fn put_document(
        &self,
        index: &str,
        id: &str,
        body: Value,
        refresh: bool,
    ) -> Result<(), SearchError>;

    /// Delete a document. A missing document is not an error.
    async fn delete_document(&self, index: &str, id: &str, refresh: bool)
        -> Result<(), SearchError>;
}

/// Create an OpenSearch client for a single node.
///
/// # Arguments
///
/// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
/// * `credentials` - Optional basic auth user and password
///
/// # Returns
///
/// * `Ok(OpenSearch)` - A client ready to use
/// * `Err(SearchError)` - If the URL is invalid or the transport cannot be built
pub fn connect(url: &str, credentials: Option<(String, String)>) -> Result<OpenSearch, SearchError> {
    let parsed_url = Url::parse(url).map_err(|e| SearchError::connection(e.to_string()))?;

    let conn_pool = SingleNodeConnectionPool::new(parsed_url);
    let mut builder = TransportBuilder::new(conn_pool).disable_proxy();
    if let Some((user, password)) = credentials {
        builder = builder.auth(Credentials::Basic(user, password));
    }
    let transport = builder
        .build()
        .map_err(|e| SearchError::connection(e.to_string()))?;

    info!(url = %url, "Created OpenSearch client");

    Ok(OpenSearch::new(transport))
}

fn refresh_param(refresh: bool) -> Refresh {
    if refresh {
        Refresh::WaitFor
    } else {
        Refresh::False
    }
}

/// Fail with the response body unless the status is a success (or one of `allowed`).
async fn check_status(
    response: Response,
    operation: &str,
    allowed: &[u16],
) -> Result<Response, SearchError> {
    let status = response.status_code();
    if status.is_success() || allowed.contains(&status.as_u16()) {
        return Ok(response);
    }

    let error_body = response.text().await.unwrap_or_default();
    error!(status = %status, body = %error_body, "{} request failed", operation);
    Err(SearchError::backend(format!(
        "{} failed with status {}: {}",
        operation, status, error_body
    )))
}

#[async_trait]
impl OpenSearchClient for OpenSearch {
    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>, SearchError> {
        let response = OpenSearch::get(self, GetParts::IndexId(index, id))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        if response.status_code().as_u16() == 404 {
            debug!(index = %index, id = %id, "Document not found");
            return Ok(None);
        }

        let response = check_status(response, "Get", &[]).await?;
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;
        Ok(Some(body))
    }

    async fn search(&self, index: &str, body: Value) -> Result<Value, SearchError> {
        let response = OpenSearch::search(self, SearchParts::Index(&[index]))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        check_status(response, "Search", &[])
            .await?
            .json::<Value>()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))
    }

    async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        let response = self
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let response = check_status(response, "Index exists", &[404]).await?;
        Ok(response.status_code().is_success())
    }

    async fn create_index(&self, index: &str, body: Value) -> Result<(), SearchError> {
        let response = self
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        check_status(response, "Index creation", &[]).await?;
        info!(index = %index, "Created index");
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<(), SearchError> {
        let response = self
            .indices()
            .delete(IndicesDeleteParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        check_status(response, "Index deletion", &[]).await?;
        info!(index = %index, "Dropped index");
        Ok(())
    }

    async fn put_document(
        &self,
        index: &str,
        id: &str,
        body: Value,
        refresh: bool,
    ) -> Result<(), SearchError> {
        let response = OpenSearch::index(self, IndexParts::IndexId(index, id))
            .body(body)
            .refresh(refresh_param(refresh))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        check_status(response, "Index", &[]).await?;
        debug!(index = %index, id = %id, "Document saved");
        Ok(())
    }

    async fn delete_document(
        &self,
        index: &str,
        id: &str,
        refresh: bool,
    ) -> Result<(), SearchError> {
        let response = OpenSearch::delete(self, DeleteParts::IndexId(index, id))
            .refresh(refresh_param(refresh))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        // 404 is acceptable - document may not exist
        check_status(response, "Delete", &[404]).await?;
        debug!(index = %index, id = %id, "Document deleted");
        Ok(())
    }
}
