//! Algolia record writes.

use std::sync::Arc;

use async_trait::async_trait;
use search_layer_shared::{Document, Index};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::algolia::client::{wait_for_task, AlgoliaClient};
use crate::errors::SearchError;
use crate::interfaces::Indexer;
use crate::marshaller::Marshaller;
use crate::task::Task;
use crate::types::TaskOptions;
use crate::utils::document_identifier;

/// Writes marshalled records, keyed by `objectID`, to Algolia.
pub struct AlgoliaIndexer {
    client: Arc<dyn AlgoliaClient>,
    marshaller: Marshaller,
}

impl AlgoliaIndexer {
    pub fn new(client: Arc<dyn AlgoliaClient>, marshaller: Marshaller) -> Self {
        Self { client, marshaller }
    }
}

#[async_trait]
impl Indexer for AlgoliaIndexer {
    #[instrument(skip(self, index, document, options), fields(index = %index.name))]
    async fn save(
        &self,
        index: &Index,
        document: Document,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        let identifier = document_identifier(index, &document)?;
        let mut record = self.marshaller.marshall(&index.fields, &document)?;
        record.insert("objectID".to_string(), Value::String(identifier.clone()));

        let task_id = self
            .client
            .save_object(&index.name, &identifier, Value::Object(record))
            .await?;
        debug!(identifier = %identifier, task_id, "Queued record");

        Ok(options
            .return_slow_promise_result
            .then(|| wait_for_task(self.client.clone(), index.name.clone(), task_id)))
    }

    #[instrument(skip(self, index, options), fields(index = %index.name))]
    async fn delete(
        &self,
        index: &Index,
        identifier: &str,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        let task_id = self.client.delete_object(&index.name, identifier).await?;

        Ok(options
            .return_slow_promise_result
            .then(|| wait_for_task(self.client.clone(), index.name.clone(), task_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algolia::mock::MockAlgoliaClient;
    use crate::marshaller::GeoPointConfig;
    use search_layer_shared::Field;
    use serde_json::json;

    fn index() -> Index {
        Index::new(
            "places",
            vec![
                Field::identifier("id"),
                Field::date_time("opened"),
                Field::geo_point("location").filterable(true),
            ],
        )
        .unwrap()
    }

    fn indexer(client: Arc<MockAlgoliaClient>) -> AlgoliaIndexer {
        AlgoliaIndexer::new(
            client,
            Marshaller::new()
                .with_date_as_integer(true)
                .with_geo_point(GeoPointConfig::keys("lat", "lng").renamed("_geoloc")),
        )
    }

    #[tokio::test]
    async fn test_save_record() {
        let client = Arc::new(MockAlgoliaClient::new());
        let indexer = indexer(client.clone());

        let document = json!({
            "id": "paris",
            "opened": "2022-01-24T12:00:00+01:00",
            "location": { "latitude": 48.85, "longitude": 2.35 },
        });
        let task = indexer
            .save(&index(), document.as_object().cloned().unwrap(), TaskOptions::wait())
            .await
            .unwrap();
        task.unwrap().wait().await.unwrap();

        let records = client.records.lock().await;
        assert_eq!(
            records[&("places".to_string(), "paris".to_string())],
            json!({
                "id": "paris",
                "opened": 1643022000,
                "opened__original": "2022-01-24T12:00:00+01:00",
                "_geoloc": { "lat": 48.85, "lng": 2.35 },
                "objectID": "paris",
            })
        );
    }

    #[tokio::test]
    async fn test_delete_record() {
        let client = Arc::new(MockAlgoliaClient::new());
        let indexer = indexer(client.clone());

        let document = json!({ "id": "paris" });
        let _ = indexer
            .save(&index(), document.as_object().cloned().unwrap(), TaskOptions::default())
            .await
            .unwrap();

        let task = indexer
            .delete(&index(), "paris", TaskOptions::default())
            .await
            .unwrap();

        assert!(task.is_none());
        assert!(client.records.lock().await.is_empty());
    }
}
