//! Typesense query compiler.

use std::sync::Arc;

use async_trait::async_trait;
use search_layer_shared::{Condition, FilterValue, Index, Search};
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

use crate::errors::SearchError;
use crate::interfaces::QueryCompiler;
use crate::marshaller::Marshaller;
use crate::types::SearchResult;
use crate::typesense::client::TypesenseClient;
use crate::utils::{attach_highlights, filter_literal, quote_filter_value};

/// Characters escaped inside quoted filter values.
const ESCAPED: [char; 2] = ['"', '&'];

/// Filter expression of one group and the free text found inside it.
#[derive(Debug, Default)]
struct Resolved {
    filter: String,
    query: Vec<String>,
    /// The group can never match, e.g. an `Or` without alternatives.
    never: bool,
}

/// Compiles searches into Typesense search parameters.
pub struct TypesenseSearcher {
    client: Arc<dyn TypesenseClient>,
    marshaller: Marshaller,
}

impl TypesenseSearcher {
    pub fn new(client: Arc<dyn TypesenseClient>, marshaller: Marshaller) -> Self {
        Self { client, marshaller }
    }

    /// Compile a search without calling Typesense.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Map))` - The search parameters
    /// * `Ok(None)` - If the filters can never match, e.g. an `In` without values
    /// * `Err(SearchError)` - If the offset is not a page boundary or free
    ///   text is nested under an `Or`
    pub fn compile(&self, search: &Search) -> Result<Option<Map<String, Value>>, SearchError> {
        let index = &search.index;
        let resolved = self.resolve(index, &search.filters, true, false)?;

        let mut params = Map::new();
        params.insert("q".to_string(), json!(resolved.query.join(" ")));
        params.insert(
            "query_by".to_string(),
            json!(index.searchable_fields().join(",")),
        );

        if !resolved.filter.is_empty() {
            params.insert("filter_by".to_string(), json!(resolved.filter));
        }

        if search.offset != 0 {
            let limit = search.limit.unwrap_or(0);
            if limit == 0 || search.offset % limit != 0 {
                return Err(SearchError::pagination_precision(search.offset, limit));
            }
            params.insert("page".to_string(), json!(search.offset / limit + 1));
        }
        if let Some(limit) = search.limit {
            params.insert("per_page".to_string(), json!(limit));
        }

        if !search.sort_by.is_empty() {
            let sort_by = search
                .sort_by
                .iter()
                .map(|(field, direction)| {
                    if index.field_by_path(field).is_none() {
                        return Err(SearchError::validation(format!("Unknown field \"{}\"", field)));
                    }
                    Ok(format!("{}:{}", field, direction.as_str()))
                })
                .collect::<Result<Vec<_>, SearchError>>()?;
            params.insert("sort_by".to_string(), json!(sort_by.join(",")));
        }

        if !search.highlight_fields.is_empty() {
            params.insert(
                "highlight_fields".to_string(),
                json!(search.highlight_fields.join(", ")),
            );
            params.insert("highlight_start_tag".to_string(), json!(search.highlight_pre_tag));
            params.insert("highlight_end_tag".to_string(), json!(search.highlight_post_tag));
        }

        Ok((!resolved.never).then_some(params))
    }

    fn resolve(
        &self,
        index: &Index,
        conditions: &[Condition],
        conjunctive: bool,
        under_or: bool,
    ) -> Result<Resolved, SearchError> {
        let mut resolved = Resolved::default();
        let mut filters = Vec::with_capacity(conditions.len());
        let mut never = 0;

        for condition in conditions {
            match condition.desugar() {
                Condition::Identifier(identifier) => filters.push(format!(
                    "id:={}",
                    quote_filter_value(&json!(identifier), &ESCAPED)
                )),
                Condition::Search(query) => {
                    if under_or {
                        return Err(SearchError::unsupported_condition(
                            "Typesense cannot combine free text with other conditions under OR",
                        ));
                    }
                    resolved.query.push(query);
                }
                Condition::Equal { field, value } => {
                    filters.push(self.comparison(index, &field, ":=", &value)?)
                }
                Condition::NotEqual { field, value } => {
                    filters.push(self.comparison(index, &field, ":!=", &value)?)
                }
                Condition::GreaterThan { field, value } => {
                    filters.push(self.comparison(index, &field, ":>", &value)?)
                }
                Condition::GreaterThanEqual { field, value } => {
                    filters.push(self.comparison(index, &field, ":>=", &value)?)
                }
                Condition::LessThan { field, value } => {
                    filters.push(self.comparison(index, &field, ":<", &value)?)
                }
                Condition::LessThanEqual { field, value } => {
                    filters.push(self.comparison(index, &field, ":<=", &value)?)
                }
                Condition::GeoDistance {
                    field,
                    latitude,
                    longitude,
                    distance,
                } => filters.push(format!(
                    "{}:({}, {}, {} km)",
                    field,
                    latitude,
                    longitude,
                    distance / 1000.0
                )),
                Condition::GeoBoundingBox {
                    field,
                    north_latitude,
                    east_longitude,
                    south_latitude,
                    west_longitude,
                } => filters.push(format!(
                    "{}:({}, {}, {}, {}, {}, {}, {}, {})",
                    field,
                    north_latitude,
                    east_longitude,
                    south_latitude,
                    east_longitude,
                    south_latitude,
                    west_longitude,
                    north_latitude,
                    west_longitude,
                )),
                Condition::And(children) => {
                    let group = self.resolve(index, &children, true, under_or)?;
                    if group.never {
                        never += 1;
                        continue;
                    }
                    if !group.filter.is_empty() {
                        filters.push(format!("({})", group.filter));
                    }
                    resolved.query.extend(group.query);
                }
                Condition::Or(children) => {
                    let group = self.resolve(index, &children, false, true)?;
                    if group.never {
                        never += 1;
                        continue;
                    }
                    if !group.filter.is_empty() {
                        filters.push(format!("({})", group.filter));
                    }
                    resolved.query.extend(group.query);
                }
                // desugar() leaves no In/NotIn behind
                Condition::In { .. } | Condition::NotIn { .. } => {
                    return Err(SearchError::unsupported_condition(
                        "Set conditions must be desugared before compilation",
                    ))
                }
            }
        }

        resolved.filter = if filters.len() < 2 {
            filters.concat()
        } else {
            filters.join(if conjunctive { " && " } else { " || " })
        };
        // A conjunction fails with any impossible member, a disjunction only with all
        resolved.never = if conjunctive {
            never > 0
        } else {
            never == conditions.len()
        };
        Ok(resolved)
    }

    fn comparison(
        &self,
        index: &Index,
        field: &str,
        operator: &str,
        value: &FilterValue,
    ) -> Result<String, SearchError> {
        let value = filter_literal(index, field, value, self.marshaller.date_as_integer())?;
        Ok(format!("{}{}{}", field, operator, quote_filter_value(&value, &ESCAPED)))
    }
}

fn highlight_fragment(hit: &Value, field: &str) -> Option<Value> {
    let mut current = hit.get("highlight")?;
    for segment in field.split('.') {
        current = current.get(segment)?;
    }
    current.get("snippet").cloned()
}

#[async_trait]
impl QueryCompiler for TypesenseSearcher {
    #[instrument(skip(self, search), fields(index = %search.index.name))]
    async fn search(&self, search: &Search) -> Result<SearchResult, SearchError> {
        let index = search.index.clone();

        if let Some(identifier) = search.single_document_lookup() {
            debug!(identifier = %identifier, "Single document lookup");
            return match self.client.retrieve_document(&index.name, identifier).await? {
                None => Ok(SearchResult::empty()),
                Some(Value::Object(document)) => {
                    let document = self.marshaller.unmarshall(&index.fields, &document)?;
                    Ok(SearchResult::new(Some(1), vec![Ok(document)]))
                }
                Some(_) => Err(SearchError::parse("Typesense returned a non object document")),
            };
        }

        let Some(params) = self.compile(search)? else {
            debug!("Filters never match, skipping the request");
            return Ok(SearchResult::empty());
        };
        debug!(params = ?params, "Compiled search");

        let mut response = self.client.search(&index.name, &params).await?;

        let total = response.get("found").and_then(Value::as_u64);
        let hits = match response.get_mut("hits").map(Value::take) {
            Some(Value::Array(hits)) => hits,
            _ => return Err(SearchError::parse("Typesense response without a hits array")),
        };

        let marshaller = self.marshaller.clone();
        let highlight_fields = search.highlight_fields.clone();
        let documents = hits.into_iter().map(move |hit| {
            let document = match hit.get("document") {
                Some(Value::Object(document)) => marshaller.unmarshall(&index.fields, document)?,
                _ => return Err(SearchError::parse("Typesense hit without a document")),
            };
            attach_highlights(document, &highlight_fields, |field| highlight_fragment(&hit, field))
        });

        Ok(SearchResult::new(total, documents))
    }
}
