//! Algolia REST transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::errors::SearchError;
use crate::http::{endpoint, json, send};
use crate::task::Task;

/// Identifier of an asynchronous Algolia indexing job.
pub type TaskId = u64;

/// The Algolia calls used by the adapter.
///
/// Every write is queued by Algolia and answered with a [`TaskId`] that can
/// be polled with [`AlgoliaClient::task_published`].
#[async_trait]
pub trait AlgoliaClient: Send + Sync {
    /// Fetch a record by object id. `Ok(None)` when it does not exist.
    async fn get_object(&self, index: &str, object_id: &str) -> Result<Option<Value>, SearchError>;

    /// Query a single index with JSON search parameters.
    async fn search_single_index(&self, index: &str, params: Value) -> Result<Value, SearchError>;

    /// Add or replace a record. The record carries its own `objectID`.
    async fn save_object(&self, index: &str, object_id: &str, record: Value)
        -> Result<TaskId, SearchError>;

    async fn delete_object(&self, index: &str, object_id: &str) -> Result<TaskId, SearchError>;

    async fn index_exists(&self, index: &str) -> Result<bool, SearchError>;

    /// Replace the settings of an index, creating it if needed.
    async fn set_settings(&self, index: &str, settings: Value) -> Result<TaskId, SearchError>;

    async fn delete_index(&self, index: &str) -> Result<TaskId, SearchError>;

    /// Whether the job has been applied.
    async fn task_published(&self, index: &str, task_id: TaskId) -> Result<bool, SearchError>;
}

/// Delay before the first status poll of a queued job.
const INITIAL_POLL_INTERVAL: Duration = Duration::from_millis(50);
/// Upper bound of the doubling poll interval.
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Polls before a job is considered stuck.
const MAX_POLLS: usize = 120;

/// A task polling until Algolia has published the job.
pub fn wait_for_task(client: Arc<dyn AlgoliaClient>, index: String, task_id: TaskId) -> Task {
    Task::from_future(async move {
        let mut interval = INITIAL_POLL_INTERVAL;
        for _ in 0..MAX_POLLS {
            if client.task_published(&index, task_id).await? {
                debug!(index = %index, task_id, "Algolia task published");
                return Ok(());
            }
            tokio::time::sleep(interval).await;
            interval = (interval * 2).min(MAX_POLL_INTERVAL);
        }

        Err(SearchError::task(format!(
            "Algolia task {} on \"{}\" was not published after {} polls",
            task_id, index, MAX_POLLS
        )))
    })
}

/// `AlgoliaClient` talking to the Algolia REST API with `reqwest`.
///
/// Reads go to the `-dsn` host, writes to the main application host.
#[derive(Debug, Clone)]
pub struct HttpAlgoliaClient {
    client: Client,
    application_id: String,
    api_key: String,
    read_host: Url,
    write_host: Url,
}

impl HttpAlgoliaClient {
    /// Create a client for an Algolia application.
    ///
    /// # Arguments
    ///
    /// * `application_id` - The Algolia application id
    /// * `api_key` - An API key allowed to search, write and manage indexes
    pub fn new(application_id: &str, api_key: &str) -> Result<Self, SearchError> {
        let read_host = Url::parse(&format!("https://{}-dsn.algolia.net", application_id))
            .map_err(|e| SearchError::config(e.to_string()))?;
        let write_host = Url::parse(&format!("https://{}.algolia.net", application_id))
            .map_err(|e| SearchError::config(e.to_string()))?;

        info!(application_id = %application_id, "Created Algolia client");

        Ok(Self {
            client: Client::new(),
            application_id: application_id.to_string(),
            api_key: api_key.to_string(),
            read_host,
            write_host,
        })
    }

    /// Send every request to `host`, e.g. a local Algolia compatible server.
    pub fn with_host(mut self, host: &str) -> Result<Self, SearchError> {
        let host = Url::parse(host).map_err(|e| SearchError::config(e.to_string()))?;
        self.read_host = host.clone();
        self.write_host = host;
        Ok(self)
    }

    fn request(&self, method: Method, write: bool, segments: &[&str]) -> Result<RequestBuilder, SearchError> {
        let host = if write { &self.write_host } else { &self.read_host };
        let url = endpoint(host, segments)?;

        Ok(self
            .client
            .request(method, url)
            .header("X-Algolia-Application-Id", &self.application_id)
            .header("X-Algolia-API-Key", &self.api_key))
    }
}

fn task_id(body: &Value) -> Result<TaskId, SearchError> {
    body.get("taskID")
        .and_then(Value::as_u64)
        .ok_or_else(|| SearchError::parse("Algolia response without a taskID"))
}

#[async_trait]
impl AlgoliaClient for HttpAlgoliaClient {
    async fn get_object(&self, index: &str, object_id: &str) -> Result<Option<Value>, SearchError> {
        let request = self.request(Method::GET, false, &["1", "indexes", index, object_id])?;
        let response = send(request, "Get object", &[404]).await?;
        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        Ok(Some(json(response).await?))
    }

    async fn search_single_index(&self, index: &str, params: Value) -> Result<Value, SearchError> {
        let request = self.request(Method::POST, false, &["1", "indexes", index, "query"])?;
        json(send(request.json(&params), "Search", &[]).await?).await
    }

    async fn save_object(
        &self,
        index: &str,
        object_id: &str,
        record: Value,
    ) -> Result<TaskId, SearchError> {
        let request = self.request(Method::PUT, true, &["1", "indexes", index, object_id])?;
        task_id(&json(send(request.json(&record), "Save object", &[]).await?).await?)
    }

    async fn delete_object(&self, index: &str, object_id: &str) -> Result<TaskId, SearchError> {
        let request = self.request(Method::DELETE, true, &["1", "indexes", index, object_id])?;
        task_id(&json(send(request, "Delete object", &[]).await?).await?)
    }

    async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        let request = self.request(Method::GET, false, &["1", "indexes", index, "settings"])?;
        let response = send(request, "Get settings", &[404]).await?;
        Ok(response.status().is_success())
    }

    async fn set_settings(&self, index: &str, settings: Value) -> Result<TaskId, SearchError> {
        let request = self.request(Method::PUT, true, &["1", "indexes", index, "settings"])?;
        task_id(&json(send(request.json(&settings), "Set settings", &[]).await?).await?)
    }

    async fn delete_index(&self, index: &str) -> Result<TaskId, SearchError> {
        let request = self.request(Method::DELETE, true, &["1", "indexes", index])?;
        task_id(&json(send(request, "Delete index", &[]).await?).await?)
    }

    async fn task_published(&self, index: &str, task_id: TaskId) -> Result<bool, SearchError> {
        let task_id = task_id.to_string();
        let request = self.request(Method::GET, false, &["1", "indexes", index, "task", &task_id])?;
        let body = json(send(request, "Task status", &[]).await?).await?;
        Ok(body.get("status").and_then(Value::as_str) == Some("published"))
    }
}
