//! Memory query evaluation.

use std::sync::Arc;

use async_trait::async_trait;
use search_layer_shared::{Document, Search};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::errors::SearchError;
use crate::interfaces::QueryCompiler;
use crate::marshaller::FlattenMarshaller;
use crate::memory::evaluate::{compare_records, highlight_value, query_terms, Evaluator};
use crate::memory::store::{missing_index, MemoryStore};
use crate::types::SearchResult;
use crate::utils::attach_highlights;

/// Evaluates searches against the records of a [`MemoryStore`].
pub struct MemorySearcher {
    store: Arc<MemoryStore>,
    marshaller: FlattenMarshaller,
}

impl MemorySearcher {
    pub fn new(store: Arc<MemoryStore>, marshaller: FlattenMarshaller) -> Self {
        Self { store, marshaller }
    }
}

#[async_trait]
impl QueryCompiler for MemorySearcher {
    #[instrument(skip(self, search), fields(index = %search.index.name))]
    async fn search(&self, search: &Search) -> Result<SearchResult, SearchError> {
        let index = search.index.clone();

        for (field, _) in &search.sort_by {
            if index.field_by_path(field).is_none() {
                return Err(SearchError::validation(format!("Unknown field \"{}\"", field)));
            }
        }

        let (total, page) = {
            let indexes = self.store.read().await;
            let records = indexes
                .get(&index.name)
                .ok_or_else(|| missing_index(&index.name))?;

            if let Some(identifier) = search.single_document_lookup() {
                debug!(identifier = %identifier, "Single document lookup");
                return match records.get(identifier) {
                    None => Ok(SearchResult::empty()),
                    Some(record) => {
                        let document = self.marshaller.unmarshall(&index.fields, record)?;
                        Ok(SearchResult::new(Some(1), vec![Ok(document)]))
                    }
                };
            }

            let evaluator = Evaluator::new(&index);
            let mut matched = Vec::new();
            for record in records.iter() {
                if evaluator.matches_all(record, &search.filters)? {
                    matched.push(record);
                }
            }
            matched.sort_by(|a, b| compare_records(a, b, &search.sort_by));

            let total = matched.len();
            let page: Vec<Document> = matched
                .into_iter()
                .skip(search.offset)
                .take(search.limit.unwrap_or(usize::MAX))
                .cloned()
                .collect();
            (total, page)
        };
        debug!(total, returned = page.len(), "Evaluated search");

        let marshaller = self.marshaller.clone();
        let terms = query_terms(&search.filters);
        let highlight_fields = search.highlight_fields.clone();
        let pre_tag = search.highlight_pre_tag.clone();
        let post_tag = search.highlight_post_tag.clone();

        let documents = page.into_iter().map(move |record| {
            let document = marshaller.unmarshall(&index.fields, &record)?;
            attach_highlights(document, &highlight_fields, |field| {
                Some(match record.get(field) {
                    Some(value) => highlight_value(value, &terms, &pre_tag, &post_tag),
                    None => Value::Null,
                })
            })
        });

        Ok(SearchResult::new(Some(total as u64), documents))
    }
}
