//! Document marshalling.
//!
//! Backends rarely store documents in the exact shape callers hand them in.
//! [`FlattenMarshaller`] turns a document into a depth-1 record for backends
//! without nested object support, [`Marshaller`] keeps the tree and only
//! adapts the parts a backend models differently (geo points, typed fields,
//! dates). Both are driven by an index's field tree and hold no state beyond
//! their construction-time policy.

mod flatten;
mod structured;

pub use flatten::{FlattenMarshaller, SOURCE_KEY};
pub use structured::{
    original_date_key, GeoKey, GeoPointConfig, Marshaller, ORIGINAL_DATE_SUFFIX, ORIGINAL_INDEX_KEY,
};

use chrono::{DateTime, NaiveDate, Utc};
use search_layer_shared::Field;
use serde_json::Value;

use crate::errors::SearchError;

/// Parse an RFC 3339 timestamp (or a plain `YYYY-MM-DD` date) into Unix seconds.
pub(crate) fn date_to_timestamp(field: &str, value: &str) -> Result<i64, SearchError> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date.timestamp());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc().timestamp())
        .ok_or_else(|| {
            SearchError::marshalling(format!(
                "Field \"{}\" holds an invalid date \"{}\"",
                field, value
            ))
        })
}

/// Render Unix seconds as an RFC 3339 timestamp in UTC.
///
/// Only used for stored dates whose original text is missing.
pub(crate) fn timestamp_to_date(field: &str, timestamp: i64) -> Result<String, SearchError> {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|date| date.to_rfc3339())
        .ok_or_else(|| {
            SearchError::marshalling(format!(
                "Field \"{}\" holds an out of range timestamp {}",
                field, timestamp
            ))
        })
}

/// Apply `f` to a field value, or to each element when the field is multiple.
///
/// Nulls are passed through untouched at both levels.
pub(crate) fn map_values(
    field: &Field,
    value: &Value,
    mut f: impl FnMut(&Value) -> Result<Value, SearchError>,
) -> Result<Value, SearchError> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Array(items) if field.multiple => items
            .iter()
            .map(|item| if item.is_null() { Ok(Value::Null) } else { f(item) })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        _ if field.multiple => Err(SearchError::marshalling(format!(
            "Field \"{}\" expects a sequence",
            field.name
        ))),
        other => f(other),
    }
}
