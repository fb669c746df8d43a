//! Algolia query compiler.

use std::sync::Arc;

use async_trait::async_trait;
use search_layer_shared::{Condition, Document, Index, Search};
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

use crate::algolia::client::AlgoliaClient;
use crate::algolia::settings::replica_name;
use crate::errors::SearchError;
use crate::interfaces::QueryCompiler;
use crate::marshaller::Marshaller;
use crate::types::SearchResult;
use crate::utils::{attach_highlights, filter_literal, quote_filter_value};

/// Characters escaped inside quoted filter values.
const ESCAPED: [char; 3] = ['\\', '"', '\''];

/// Metadata Algolia adds to every record.
const OBJECT_ID: &str = "objectID";

/// A compiled search: the index (or sort replica) to query and its
/// parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct AlgoliaQuery {
    pub index_name: String,
    pub params: Value,
}

/// Filters of one group together with the parameters its conditions
/// contributed outside of the filter string.
#[derive(Debug, Default)]
struct Resolved {
    filter: String,
    query: Vec<String>,
    geo: Map<String, Value>,
    /// The group can never match, e.g. an `Or` without alternatives.
    never: bool,
}

impl Resolved {
    fn absorb_geo(&mut self, geo: Map<String, Value>) -> Result<(), SearchError> {
        if geo.is_empty() {
            return Ok(());
        }
        if !self.geo.is_empty() {
            return Err(SearchError::unsupported_condition(
                "Algolia accepts a single geo condition per search",
            ));
        }
        self.geo = geo;
        Ok(())
    }
}

/// Compiles searches into Algolia search parameters.
pub struct AlgoliaSearcher {
    client: Arc<dyn AlgoliaClient>,
    marshaller: Marshaller,
}

impl AlgoliaSearcher {
    pub fn new(client: Arc<dyn AlgoliaClient>, marshaller: Marshaller) -> Self {
        Self { client, marshaller }
    }

    /// Compile a search without calling Algolia.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(AlgoliaQuery))` - The index to query and its parameters
    /// * `Ok(None)` - If the filters can never match, e.g. an `In` without values
    /// * `Err(SearchError)` - If the search sorts on more than one key or
    ///   nests free text or geo conditions under an `Or`
    pub fn compile(&self, search: &Search) -> Result<Option<AlgoliaQuery>, SearchError> {
        let index = &search.index;

        let index_name = match search.sort_by.as_slice() {
            [] => index.name.clone(),
            [(field, direction)] => {
                if index.field_by_path(field).is_none() {
                    return Err(SearchError::validation(format!("Unknown field \"{}\"", field)));
                }
                replica_name(&index.name, field, *direction)
            }
            _ => {
                return Err(SearchError::unsupported_sort(
                    "Algolia sorts through replica indexes and supports a single sort key",
                ))
            }
        };

        let resolved = self.resolve(index, &search.filters, true, false)?;
        let never = resolved.never;

        let mut params = Map::new();
        let filter = strip_outer_group(&resolved.filter);
        if !filter.is_empty() {
            params.insert("filters".to_string(), json!(filter));
        }
        params.extend(resolved.geo);

        if search.offset != 0 {
            params.insert("offset".to_string(), json!(search.offset));
        }
        if let Some(limit) = search.limit {
            params.insert("length".to_string(), json!(limit));
            // length is ignored without an offset
            params
                .entry("offset")
                .or_insert_with(|| json!(0));
        }

        if !resolved.query.is_empty() {
            params.insert("query".to_string(), json!(resolved.query.join(" ")));
        }

        if !search.highlight_fields.is_empty() {
            params.insert(
                "attributesToHighlight".to_string(),
                json!(search.highlight_fields),
            );
            params.insert("highlightPreTag".to_string(), json!(search.highlight_pre_tag));
            params.insert("highlightPostTag".to_string(), json!(search.highlight_post_tag));
        }

        Ok((!never).then(|| AlgoliaQuery {
            index_name,
            params: Value::Object(params),
        }))
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
                    "{}:{}",
                    index.identifier_field().name,
                    quote_filter_value(&json!(identifier), &ESCAPED)
                )),
                Condition::Search(query) => {
                    if under_or {
                        return Err(SearchError::unsupported_condition(
                            "Algolia cannot combine free text with other conditions under OR",
                        ));
                    }
                    resolved.query.push(query);
                }
                Condition::Equal { field, value } => {
                    let value = self.literal(index, &field, &value)?;
                    filters.push(format!("{}:{}", field, value));
                }
                Condition::NotEqual { field, value } => {
                    let value = self.literal(index, &field, &value)?;
                    filters.push(format!("NOT {}:{}", field, value));
                }
                Condition::GreaterThan { field, value } => {
                    let value = self.literal(index, &field, &value)?;
                    filters.push(format!("{} > {}", field, value));
                }
                Condition::GreaterThanEqual { field, value } => {
                    let value = self.literal(index, &field, &value)?;
                    filters.push(format!("{} >= {}", field, value));
                }
                Condition::LessThan { field, value } => {
                    let value = self.literal(index, &field, &value)?;
                    filters.push(format!("{} < {}", field, value));
                }
                Condition::LessThanEqual { field, value } => {
                    let value = self.literal(index, &field, &value)?;
                    filters.push(format!("{} <= {}", field, value));
                }
                Condition::GeoDistance {
                    latitude,
                    longitude,
                    distance,
                    ..
                } => {
                    check_geo_placement(under_or)?;
                    let mut geo = Map::new();
                    geo.insert(
                        "aroundLatLng".to_string(),
                        json!(format!("{}, {}", latitude, longitude)),
                    );
                    geo.insert("aroundRadius".to_string(), json!(distance.round() as i64));
                    resolved.absorb_geo(geo)?;
                }
                Condition::GeoBoundingBox {
                    north_latitude,
                    east_longitude,
                    south_latitude,
                    west_longitude,
                    ..
                } => {
                    check_geo_placement(under_or)?;
                    let mut geo = Map::new();
                    geo.insert(
                        "insideBoundingBox".to_string(),
                        json!([[north_latitude, west_longitude, south_latitude, east_longitude]]),
                    );
                    resolved.absorb_geo(geo)?;
                }
                Condition::And(children) => {
                    let group = self.resolve(index, &children, true, under_or)?;
                    if group.never {
                        never += 1;
                        continue;
                    }
                    self.merge_group(&mut resolved, &mut filters, group)?;
                }
                Condition::Or(children) => {
                    let group = self.resolve(index, &children, false, true)?;
                    if group.never {
                        never += 1;
                        continue;
                    }
                    self.merge_group(&mut resolved, &mut filters, group)?;
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
            filters.join(if conjunctive { " AND " } else { " OR " })
        };
        // A conjunction fails with any impossible member, a disjunction only with all
        resolved.never = if conjunctive {
            never > 0
        } else {
            never == conditions.len()
        };
        Ok(resolved)
    }

    fn merge_group(
        &self,
        resolved: &mut Resolved,
        filters: &mut Vec<String>,
        group: Resolved,
    ) -> Result<(), SearchError> {
        if !group.filter.is_empty() {
            filters.push(format!("({})", group.filter));
        }
        resolved.query.extend(group.query);
        resolved.absorb_geo(group.geo)
    }

    fn literal(
        &self,
        index: &Index,
        field: &str,
        value: &search_layer_shared::FilterValue,
    ) -> Result<String, SearchError> {
        let value = filter_literal(index, field, value, self.marshaller.date_as_integer())?;
        Ok(quote_filter_value(&value, &ESCAPED))
    }

    fn hit_document(&self, index: &Index, mut hit: Map<String, Value>) -> Result<Document, SearchError> {
        hit.remove(OBJECT_ID);
        self.marshaller.unmarshall(&index.fields, &hit)
    }
}

fn check_geo_placement(under_or: bool) -> Result<(), SearchError> {
    if under_or {
        return Err(SearchError::unsupported_condition(
            "Algolia geo filters are search parameters and cannot be nested under OR",
        ));
    }
    Ok(())
}

/// Remove the parentheses around the whole filter, but only when they
/// enclose a single group: `(a OR b)` becomes `a OR b` while
/// `(a OR b) AND (c OR d)` is left alone.
fn strip_outer_group(filter: &str) -> &str {
    if !(filter.starts_with('(') && filter.ends_with(')')) {
        return filter;
    }

    let last = filter.len() - 1;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (position, c) in filter.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && position != last {
                    return filter;
                }
            }
            _ => {}
        }
    }

    &filter[1..last]
}

fn highlight_fragment(hit: &Map<String, Value>, field: &str) -> Option<Value> {
    let mut current = hit.get("_highlightResult")?;
    for segment in field.split('.') {
        current = current.get(segment)?;
    }
    current.get("value").cloned()
}

#[async_trait]
impl QueryCompiler for AlgoliaSearcher {
    #[instrument(skip(self, search), fields(index = %search.index.name))]
    async fn search(&self, search: &Search) -> Result<SearchResult, SearchError> {
        let index = search.index.clone();

        if let Some(identifier) = search.single_document_lookup() {
            debug!(identifier = %identifier, "Single document lookup");
            return match self.client.get_object(&index.name, identifier).await? {
                None => Ok(SearchResult::empty()),
                Some(Value::Object(hit)) => {
                    let document = self.hit_document(&index, hit)?;
                    Ok(SearchResult::new(Some(1), vec![Ok(document)]))
                }
                Some(_) => Err(SearchError::parse("Algolia returned a non object record")),
            };
        }

        let Some(query) = self.compile(search)? else {
            debug!("Filters never match, skipping the request");
            return Ok(SearchResult::empty());
        };
        debug!(index_name = %query.index_name, params = %query.params, "Compiled search");

        let mut response = self
            .client
            .search_single_index(&query.index_name, query.params)
            .await?;

        let total = response.get("nbHits").and_then(Value::as_u64);
        let hits = match response.get_mut("hits").map(Value::take) {
            Some(Value::Array(hits)) => hits,
            _ => return Err(SearchError::parse("Algolia response without a hits array")),
        };

        let marshaller = self.marshaller.clone();
        let highlight_fields = search.highlight_fields.clone();
        let documents = hits.into_iter().map(move |hit| {
            let Value::Object(mut hit) = hit else {
                return Err(SearchError::parse("Algolia returned a non object hit"));
            };
            let highlights: Map<String, Value> = highlight_fields
                .iter()
                .filter_map(|field| highlight_fragment(&hit, field).map(|f| (field.clone(), f)))
                .collect();

            hit.remove(OBJECT_ID);
            hit.remove("_highlightResult");
            hit.remove("_snippetResult");
            hit.remove("_rankingInfo");
            let document = marshaller.unmarshall(&index.fields, &hit)?;

            attach_highlights(document, &highlight_fields, |field| highlights.get(field).cloned())
        });

        Ok(SearchResult::new(total, documents))
    }
}
