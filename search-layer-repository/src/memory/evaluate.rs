//! In-process evaluation of conditions, sort keys and highlights against
//! flattened records.

use std::cmp::Ordering;

use search_layer_shared::{Condition, Document, FilterValue, Index, SortDirection};
use serde_json::Value;

use crate::errors::SearchError;
use crate::utils::filter_literal;

/// Mean earth radius in meters.
const EARTH_RADIUS: f64 = 6_371_008.8;

/// The non null values stored under a flattened key, spreading sequences.
fn values_at<'a>(record: &'a Document, path: &str) -> Vec<&'a Value> {
    match record.get(path) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(values)) => values.iter().filter(|v| !v.is_null()).collect(),
        Some(value) => vec![value],
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    compare_values(a, b) == Some(Ordering::Equal)
}

/// A scalar rendered the way identifiers are compared.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Lowercased free text terms of a query.
pub(crate) fn terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|term| term.to_ascii_lowercase())
        .collect()
}

/// Every free text term found in a condition tree, in order.
pub(crate) fn query_terms(conditions: &[Condition]) -> Vec<String> {
    let mut found = Vec::new();
    for condition in conditions {
        match condition {
            Condition::Search(query) => found.extend(terms(query)),
            Condition::And(children) | Condition::Or(children) => {
                found.extend(query_terms(children))
            }
            _ => {}
        }
    }
    found
}

fn geo_coordinates(value: &Value) -> Option<(f64, f64)> {
    Some((
        value.get("latitude")?.as_f64()?,
        value.get("longitude")?.as_f64()?,
    ))
}

/// Great circle distance in meters.
pub(crate) fn haversine(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());

    let a = ((lat2 - lat1) / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * ((lon2 - lon1) / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS * a.sqrt().asin()
}

/// Whether a longitude lies between `west` and `east`, wrapping across the
/// antimeridian when `west` is greater than `east`.
fn within_longitudes(longitude: f64, west: f64, east: f64) -> bool {
    if west <= east {
        (west..=east).contains(&longitude)
    } else {
        longitude >= west || longitude <= east
    }
}

/// Evaluates conditions against the flattened records of one index.
pub(crate) struct Evaluator<'a> {
    index: &'a Index,
}

impl<'a> Evaluator<'a> {
    pub fn new(index: &'a Index) -> Self {
        Self { index }
    }

    /// Whether every condition holds for the record.
    pub fn matches_all(&self, record: &Document, conditions: &[Condition]) -> Result<bool, SearchError> {
        for condition in conditions {
            if !self.matches(record, condition)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn matches_any(&self, record: &Document, conditions: &[Condition]) -> Result<bool, SearchError> {
        for condition in conditions {
            if self.matches(record, condition)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn matches(&self, record: &Document, condition: &Condition) -> Result<bool, SearchError> {
        Ok(match condition {
            Condition::Identifier(identifier) => {
                let field = &self.index.identifier_field().name;
                values_at(record, field)
                    .into_iter()
                    .any(|value| scalar_string(value).as_deref() == Some(identifier.as_str()))
            }
            Condition::Search(query) => self.matches_text(record, query),
            Condition::Equal { field, value } => {
                let literal = self.literal(field, value)?;
                values_at(record, field).into_iter().any(|v| values_equal(v, &literal))
            }
            Condition::NotEqual { field, value } => {
                let literal = self.literal(field, value)?;
                !values_at(record, field).into_iter().any(|v| values_equal(v, &literal))
            }
            Condition::GreaterThan { field, value } => {
                self.compare(record, field, value, |o| o == Ordering::Greater)?
            }
            Condition::GreaterThanEqual { field, value } => {
                self.compare(record, field, value, |o| o != Ordering::Less)?
            }
            Condition::LessThan { field, value } => {
                self.compare(record, field, value, |o| o == Ordering::Less)?
            }
            Condition::LessThanEqual { field, value } => {
                self.compare(record, field, value, |o| o != Ordering::Greater)?
            }
            Condition::In { field, values } => {
                let literals = self.literals(field, values)?;
                values_at(record, field)
                    .into_iter()
                    .any(|v| literals.iter().any(|literal| values_equal(v, literal)))
            }
            Condition::NotIn { field, values } => {
                let literals = self.literals(field, values)?;
                !values_at(record, field)
                    .into_iter()
                    .any(|v| literals.iter().any(|literal| values_equal(v, literal)))
            }
            Condition::GeoDistance {
                field,
                latitude,
                longitude,
                distance,
            } => values_at(record, field)
                .into_iter()
                .filter_map(geo_coordinates)
                .any(|point| haversine((*latitude, *longitude), point) <= *distance),
            Condition::GeoBoundingBox {
                field,
                north_latitude,
                east_longitude,
                south_latitude,
                west_longitude,
            } => values_at(record, field)
                .into_iter()
                .filter_map(geo_coordinates)
                .any(|(latitude, longitude)| {
                    (*south_latitude..=*north_latitude).contains(&latitude)
                        && within_longitudes(longitude, *west_longitude, *east_longitude)
                }),
            Condition::And(children) => self.matches_all(record, children)?,
            Condition::Or(children) => self.matches_any(record, children)?,
        })
    }

    /// Every term must occur, case insensitively, in some searchable field.
    fn matches_text(&self, record: &Document, query: &str) -> bool {
        let haystacks: Vec<String> = self
            .index
            .searchable_fields()
            .iter()
            .flat_map(|path| values_at(record, path))
            .filter_map(Value::as_str)
            .map(str::to_ascii_lowercase)
            .collect();

        terms(query)
            .iter()
            .all(|term| haystacks.iter().any(|haystack| haystack.contains(term.as_str())))
    }

    fn literal(&self, field: &str, value: &FilterValue) -> Result<Value, SearchError> {
        filter_literal(self.index, field, value, true)
    }

    fn literals(&self, field: &str, values: &[FilterValue]) -> Result<Vec<Value>, SearchError> {
        values.iter().map(|value| self.literal(field, value)).collect()
    }

    fn compare(
        &self,
        record: &Document,
        field: &str,
        value: &FilterValue,
        accept: impl Fn(Ordering) -> bool,
    ) -> Result<bool, SearchError> {
        let literal = self.literal(field, value)?;
        Ok(values_at(record, field)
            .into_iter()
            .filter_map(|v| compare_values(v, &literal))
            .any(accept))
    }
}

/// Order two records by the given sort keys. Records without a value sort
/// before records with one in ascending order.
pub(crate) fn compare_records(
    a: &Document,
    b: &Document,
    sort_by: &[(String, SortDirection)],
) -> Ordering {
    for (field, direction) in sort_by {
        let left = values_at(a, field).into_iter().next();
        let right = values_at(b, field).into_iter().next();

        let ordering = match (left, right) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(left), Some(right)) => compare_values(left, right).unwrap_or(Ordering::Equal),
        };

        let ordering = match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Wrap every occurrence of `terms` in `text` with the given tags.
pub(crate) fn highlight_text(text: &str, terms: &[String], pre_tag: &str, post_tag: &str) -> String {
    let lower = text.to_ascii_lowercase();
    let mut highlighted = String::with_capacity(text.len());
    let mut position = 0;

    while position < text.len() {
        let matched = terms
            .iter()
            .filter(|term| !term.is_empty() && lower[position..].starts_with(term.as_str()))
            .map(|term| term.len())
            .max();

        match matched {
            Some(length) => {
                highlighted.push_str(pre_tag);
                highlighted.push_str(&text[position..position + length]);
                highlighted.push_str(post_tag);
                position += length;
            }
            None => {
                let next = text[position..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
                highlighted.push_str(&text[position..position + next]);
                position += next;
            }
        }
    }

    highlighted
}

/// Highlight a stored value: strings are highlighted, sequences element
/// wise, anything else is returned unchanged.
pub(crate) fn highlight_value(value: &Value, terms: &[String], pre_tag: &str, post_tag: &str) -> Value {
    match value {
        Value::String(text) => Value::String(highlight_text(text, terms, pre_tag, post_tag)),
        Value::Array(values) => Value::Array(
            values
                .iter()
                .map(|value| highlight_value(value, terms, pre_tag, post_tag))
                .collect(),
        ),
        other => other.clone(),
    }
}
