//! Typesense document writes.

use std::sync::Arc;

use async_trait::async_trait;
use search_layer_shared::{Document, Index};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::errors::SearchError;
use crate::interfaces::Indexer;
use crate::marshaller::Marshaller;
use crate::task::Task;
use crate::types::TaskOptions;
use crate::typesense::client::TypesenseClient;
use crate::utils::document_identifier;

/// Upserts marshalled documents into Typesense collections.
///
/// Typesense keys documents by a string `id`; it is set from the index's
/// identifier field whatever that field is called.
pub struct TypesenseIndexer {
    client: Arc<dyn TypesenseClient>,
    marshaller: Marshaller,
}

impl TypesenseIndexer {
    pub fn new(client: Arc<dyn TypesenseClient>, marshaller: Marshaller) -> Self {
        Self { client, marshaller }
    }
}

#[async_trait]
impl Indexer for TypesenseIndexer {
    #[instrument(skip(self, index, document, options), fields(index = %index.name))]
    async fn save(
        &self,
        index: &Index,
        document: Document,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        let identifier = document_identifier(index, &document)?;
        let mut record = self.marshaller.marshall(&index.fields, &document)?;
        record.insert("id".to_string(), Value::String(identifier.clone()));

        self.client
            .upsert_document(&index.name, Value::Object(record))
            .await?;
        debug!(identifier = %identifier, "Upserted document");

        Ok(options.return_slow_promise_result.then(Task::completed))
    }

    #[instrument(skip(self, index, options), fields(index = %index.name))]
    async fn delete(
        &self,
        index: &Index,
        identifier: &str,
        options: TaskOptions,
    ) -> Result<Option<Task>, SearchError> {
        self.client.delete_document(&index.name, identifier).await?;

        Ok(options.return_slow_promise_result.then(Task::completed))
    }
}
