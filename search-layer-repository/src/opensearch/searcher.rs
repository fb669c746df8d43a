//! OpenSearch query compiler.

use std::sync::Arc;

use async_trait::async_trait;
use search_layer_shared::{Condition, Document, FieldKind, Index, Search};
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

use crate::errors::SearchError;
use crate::interfaces::QueryCompiler;
use crate::marshaller::Marshaller;
use crate::opensearch::client::OpenSearchClient;
use crate::types::SearchResult;
use crate::utils::attach_highlights;

/// Compiles searches into OpenSearch `_search` bodies.
pub struct OpenSearchSearcher {
    client: Arc<dyn OpenSearchClient>,
    marshaller: Marshaller,
}

impl OpenSearchSearcher {
    pub fn new(client: Arc<dyn OpenSearchClient>, marshaller: Marshaller) -> Self {
        Self { client, marshaller }
    }

    /// Build the request body for a search.
    ///
    /// Pure: no client call is made, so every unsupported construct is
    /// rejected before any I/O.
    ///
    /// # Arguments
    ///
    /// * `search` - The search request
    ///
    /// # Returns
    ///
    /// * `Ok(Value)` - The `_search` body
    /// * `Err(SearchError)` - If a condition or sort key cannot be expressed
    pub fn compile(&self, search: &Search) -> Result<Value, SearchError> {
        let mut body = Map::new();

        let query = resolve(&search.index, &search.filters, true)?
            .unwrap_or_else(|| json!({ "match_all": {} }));
        body.insert("query".to_string(), query);

        if !search.sort_by.is_empty() {
            let sort = search
                .sort_by
                .iter()
                .map(|(field, direction)| {
                    let key = filter_field(&search.index, field)?;
                    Ok(json!({ key: direction.as_str() }))
                })
                .collect::<Result<Vec<_>, SearchError>>()?;
            body.insert("sort".to_string(), Value::Array(sort));
        }

        if search.offset != 0 {
            body.insert("from".to_string(), json!(search.offset));
        }
        if let Some(limit) = search.limit {
            body.insert("size".to_string(), json!(limit));
        }

        if !search.highlight_fields.is_empty() {
            let fields: Map<String, Value> = search
                .highlight_fields
                .iter()
                .map(|field| {
                    (
                        field.clone(),
                        json!({
                            "pre_tags": [search.highlight_pre_tag],
                            "post_tags": [search.highlight_post_tag],
                        }),
                    )
                })
                .collect();
            body.insert("highlight".to_string(), json!({ "fields": fields }));
        }

        Ok(Value::Object(body))
    }
}

fn hit_document(marshaller: &Marshaller, index: &Index, hit: &Value) -> Result<Document, SearchError> {
    match hit.get("_source") {
        Some(Value::Object(source)) => marshaller.unmarshall(&index.fields, source),
        _ => Err(SearchError::parse("Hit without an object _source")),
    }
}

/// Translate a list of conditions combined with `conjunctive`.
///
/// Returns `None` when there is nothing to filter on. A single clause is
/// returned unwrapped.
fn resolve(
    index: &Index,
    conditions: &[Condition],
    conjunctive: bool,
) -> Result<Option<Value>, SearchError> {
    let mut clauses = Vec::with_capacity(conditions.len());
    for condition in conditions {
        if let Some(clause) = clause(index, condition)? {
            clauses.push(clause);
        }
    }

    Ok(match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        _ => {
            let combinator = if conjunctive { "must" } else { "should" };
            Some(json!({ "bool": { combinator: clauses } }))
        }
    })
}

fn clause(index: &Index, condition: &Condition) -> Result<Option<Value>, SearchError> {
    let clause = match condition {
        Condition::Identifier(identifier) => json!({ "ids": { "values": [identifier] } }),
        Condition::Search(query) => json!({ "query_string": { "query": query } }),
        Condition::Equal { field, value } => {
            let key = filter_field(index, field)?;
            json!({ "term": { key: { "value": value.to_json() } } })
        }
        Condition::NotEqual { field, value } => {
            let key = filter_field(index, field)?;
            json!({ "bool": { "must_not": { "term": { key: { "value": value.to_json() } } } } })
        }
        Condition::GreaterThan { field, value } => range(index, field, "gt", value.to_json())?,
        Condition::GreaterThanEqual { field, value } => range(index, field, "gte", value.to_json())?,
        Condition::LessThan { field, value } => range(index, field, "lt", value.to_json())?,
        Condition::LessThanEqual { field, value } => range(index, field, "lte", value.to_json())?,
        Condition::In { field, values } => {
            let key = filter_field(index, field)?;
            let values: Vec<Value> = values.iter().map(|v| v.to_json()).collect();
            json!({ "terms": { key: values } })
        }
        Condition::NotIn { field, values } => {
            let key = filter_field(index, field)?;
            let values: Vec<Value> = values.iter().map(|v| v.to_json()).collect();
            json!({ "bool": { "must_not": { "terms": { key: values } } } })
        }
        Condition::GeoDistance {
            field,
            latitude,
            longitude,
            distance,
        } => json!({
            "geo_distance": {
                "distance": format!("{}m", distance),
                field.as_str(): { "lat": latitude, "lon": longitude },
            }
        }),
        Condition::GeoBoundingBox {
            field,
            north_latitude,
            east_longitude,
            south_latitude,
            west_longitude,
        } => json!({
            "geo_bounding_box": {
                field.as_str(): {
                    "top_left": { "lat": north_latitude, "lon": west_longitude },
                    "bottom_right": { "lat": south_latitude, "lon": east_longitude },
                }
            }
        }),
        Condition::And(children) => return resolve(index, children, true),
        Condition::Or(children) if children.is_empty() => {
            json!({ "bool": { "must_not": { "match_all": {} } } })
        }
        Condition::Or(children) => return resolve(index, children, false),
    };

    Ok(Some(clause))
}

fn range(index: &Index, field: &str, operator: &str, value: Value) -> Result<Value, SearchError> {
    let key = filter_field(index, field)?;
    Ok(json!({ "range": { key: { operator: value } } }))
}

/// Text fields are analyzed, exact matching and sorting go through the
/// `raw` keyword sub-field.
fn filter_field(index: &Index, path: &str) -> Result<String, SearchError> {
    let field = index
        .field_by_path(path)
        .ok_or_else(|| SearchError::validation(format!("Unknown field \"{}\"", path)))?;

    Ok(match field.kind() {
        FieldKind::Text => format!("{}.raw", path),
        _ => path.to_string(),
    })
}

#[async_trait]
impl QueryCompiler for OpenSearchSearcher {
    #[instrument(skip(self, search), fields(index = %search.index.name))]
    async fn search(&self, search: &Search) -> Result<SearchResult, SearchError> {
        let index = search.index.clone();

        if let Some(identifier) = search.single_document_lookup() {
            debug!(identifier = %identifier, "Single document lookup");
            return match self.client.get_document(&index.name, identifier).await? {
                None => Ok(SearchResult::empty()),
                Some(hit) => {
                    let document = hit_document(&self.marshaller, &index, &hit)?;
                    Ok(SearchResult::new(Some(1), vec![Ok(document)]))
                }
            };
        }

        let body = self.compile(search)?;
        debug!(body = %body, "Compiled search body");

        let response = self.client.search(&index.name, body).await?;

        let total = response
            .pointer("/hits/total/value")
            .and_then(Value::as_u64);
        let hits = match response.pointer("/hits/hits") {
            Some(Value::Array(hits)) => hits.clone(),
            _ => return Err(SearchError::parse("OpenSearch response without a hits array")),
        };

        let marshaller = self.marshaller.clone();
        let highlight_fields = search.highlight_fields.clone();
        let documents = hits.into_iter().map(move |hit| {
            let document = hit_document(&marshaller, &index, &hit)?;
            attach_highlights(document, &highlight_fields, |field| {
                hit.get("highlight")
                    .and_then(|highlight| highlight.get(field))
                    .and_then(|fragments| fragments.get(0))
                    .cloned()
            })
        });

        Ok(SearchResult::new(total, documents))
    }
}
