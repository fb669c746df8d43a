//! Algolia index lifecycle.

use std::sync::Arc;

use async_trait::async_trait;
use search_layer_shared::Index;
use tracing::info;

use crate::algolia::client::{wait_for_task, AlgoliaClient};
use crate::algolia::settings::{index_settings, replicas};
use crate::errors::SearchError;
use crate::interfaces::SchemaManager;
use crate::task::Task;
use crate::types::TaskOptions;

/// Creates and drops an Algolia index together with its sort replicas.
pub struct AlgoliaSchemaManager {
    client: Arc<dyn AlgoliaClient>,
}

impl AlgoliaSchemaManager {
    pub fn new(client: Arc<dyn AlgoliaClient>) -> Self {
        Self { client }
    }

    fn join(&self, jobs: Vec<(String, u64)>) -> Task {
        Task::join(
            jobs.into_iter()
                .map(|(index, task_id)| wait_for_task(self.client.clone(), index, task_id))
                .collect(),
        )
    }
}

#[async_trait]
impl SchemaManager for AlgoliaSchemaManager {
    async fn exists_index(&self, index: &Index) -> Result<bool, SearchError> {
        self.client.index_exists(&index.name).await
    }

    async fn create_index(
        &self,
        index: &Index,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        let mut jobs = Vec::new();

        let task_id = self
            .client
            .set_settings(&index.name, index_settings(index))
            .await?;
        jobs.push((index.name.clone(), task_id));

        for (replica, settings) in replicas(index) {
            let task_id = self.client.set_settings(&replica, settings).await?;
            jobs.push((replica, task_id));
        }

        info!(index = %index.name, replicas = jobs.len() - 1, "Index created");

        Ok(options.return_slow_promise_result.then(|| self.join(jobs)))
    }

    async fn drop_index(
        &self,
        index: &Index,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        let mut jobs = Vec::new();

        // Deleting the primary detaches its replicas, which are then plain
        // indexes of their own.
        let task_id = self.client.delete_index(&index.name).await?;
        jobs.push((index.name.clone(), task_id));

        for (replica, _) in replicas(index) {
            let task_id = self.client.delete_index(&replica).await?;
            jobs.push((replica, task_id));
        }

        info!(index = %index.name, "Index dropped");

        Ok(options.return_slow_promise_result.then(|| self.join(jobs)))
    }
}
