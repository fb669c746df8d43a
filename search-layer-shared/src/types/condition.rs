//! Condition algebra.
//!
//! Filters are expressed as a tree of [`Condition`] nodes. Leaves compare a
//! field against a value, match free text or select a geo area; `And` and
//! `Or` combine children. The tree is backend neutral: each adapter
//! compiles it into its own native query language.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A scalar value compared against a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl FilterValue {
    /// Converts the value into its JSON representation.
    pub fn to_json(&self) -> Value {
        match self {
            FilterValue::Bool(b) => Value::Bool(*b),
            FilterValue::Integer(i) => Value::from(*i),
            FilterValue::Float(f) => Value::from(*f),
            FilterValue::String(s) => Value::String(s.clone()),
        }
    }

    /// Returns the value as a float when it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FilterValue::Integer(i) => Some(*i as f64),
            FilterValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl std::fmt::Display for FilterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterValue::Bool(b) => write!(f, "{}", b),
            FilterValue::Integer(i) => write!(f, "{}", i),
            FilterValue::Float(v) => write!(f, "{}", v),
            FilterValue::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Integer(value.into())
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Float(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::String(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::String(value)
    }
}

/// A node in a filter tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Matches the document with the given identifier.
    Identifier(String),
    /// Free-text relevance query.
    Search(String),
    Equal { field: String, value: FilterValue },
    NotEqual { field: String, value: FilterValue },
    GreaterThan { field: String, value: FilterValue },
    GreaterThanEqual { field: String, value: FilterValue },
    LessThan { field: String, value: FilterValue },
    LessThanEqual { field: String, value: FilterValue },
    In { field: String, values: Vec<FilterValue> },
    NotIn { field: String, values: Vec<FilterValue> },
    /// Points within `distance` meters of the center.
    GeoDistance {
        field: String,
        latitude: f64,
        longitude: f64,
        distance: f64,
    },
    GeoBoundingBox {
        field: String,
        north_latitude: f64,
        east_longitude: f64,
        south_latitude: f64,
        west_longitude: f64,
    },
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    pub fn identifier(identifier: impl Into<String>) -> Self {
        Condition::Identifier(identifier.into())
    }

    pub fn search(query: impl Into<String>) -> Self {
        Condition::Search(query.into())
    }

    pub fn equal(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Condition::Equal {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn not_equal(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Condition::NotEqual {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn greater_than(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Condition::GreaterThan {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn greater_than_equal(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Condition::GreaterThanEqual {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn less_than(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Condition::LessThan {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn less_than_equal(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Condition::LessThanEqual {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn in_values<V: Into<FilterValue>>(field: impl Into<String>, values: Vec<V>) -> Self {
        Condition::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn not_in_values<V: Into<FilterValue>>(field: impl Into<String>, values: Vec<V>) -> Self {
        Condition::NotIn {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Points within `distance` meters of (`latitude`, `longitude`).
    pub fn geo_distance(field: impl Into<String>, latitude: f64, longitude: f64, distance: f64) -> Self {
        Condition::GeoDistance {
            field: field.into(),
            latitude,
            longitude,
            distance,
        }
    }

    pub fn geo_bounding_box(
        field: impl Into<String>,
        north_latitude: f64,
        east_longitude: f64,
        south_latitude: f64,
        west_longitude: f64,
    ) -> Self {
        Condition::GeoBoundingBox {
            field: field.into(),
            north_latitude,
            east_longitude,
            south_latitude,
            west_longitude,
        }
    }

    pub fn and(conditions: Vec<Condition>) -> Self {
        Condition::And(conditions)
    }

    pub fn or(conditions: Vec<Condition>) -> Self {
        Condition::Or(conditions)
    }

    /// Rewrite a set condition into plain comparisons.
    ///
    /// `In` becomes an `Or` of `Equal`, `NotIn` an `And` of `NotEqual`. Any
    /// other node is returned unchanged; children are not visited, callers
    /// desugar while they walk the tree.
    pub fn desugar(&self) -> Condition {
        match self {
            Condition::In { field, values } => Condition::Or(
                values
                    .iter()
                    .map(|v| Condition::Equal {
                        field: field.clone(),
                        value: v.clone(),
                    })
                    .collect(),
            ),
            Condition::NotIn { field, values } => Condition::And(
                values
                    .iter()
                    .map(|v| Condition::NotEqual {
                        field: field.clone(),
                        value: v.clone(),
                    })
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Returns the field this condition targets, if it targets one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Condition::Equal { field, .. }
            | Condition::NotEqual { field, .. }
            | Condition::GreaterThan { field, .. }
            | Condition::GreaterThanEqual { field, .. }
            | Condition::LessThan { field, .. }
            | Condition::LessThanEqual { field, .. }
            | Condition::In { field, .. }
            | Condition::NotIn { field, .. }
            | Condition::GeoDistance { field, .. }
            | Condition::GeoBoundingBox { field, .. } => Some(field),
            _ => None,
        }
    }
}
