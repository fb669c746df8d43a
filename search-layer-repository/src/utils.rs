//! Utility functions shared by the adapters.

use search_layer_shared::{Document, FieldKind, FilterValue, Index};
use serde_json::{Map, Value};

use crate::errors::SearchError;
use crate::marshaller::date_to_timestamp;

/// Key under which highlighted fragments are attached to a document.
pub const FORMATTED_KEY: &str = "_formatted";

/// Extract the identifier of a document as a string.
///
/// String identifiers are returned as is, numeric ones are rendered.
///
/// # Arguments
///
/// * `index` - The index the document belongs to
/// * `document` - The document
///
/// # Returns
///
/// * `Ok(String)` - The identifier
/// * `Err(SearchError)` - If the identifier is missing or not a scalar
///
/// # Example
///
/// ```
/// use search_layer_repository::utils::document_identifier;
/// use search_layer_shared::{Field, Index};
/// use serde_json::json;
///
/// let index = Index::new("blog", vec![Field::identifier("id")]).unwrap();
/// let document = json!({ "id": 42 });
///
/// assert_eq!(
///     document_identifier(&index, document.as_object().unwrap()).unwrap(),
///     "42"
/// );
/// ```
pub fn document_identifier(index: &Index, document: &Document) -> Result<String, SearchError> {
    let name = &index.identifier_field().name;

    match document.get(name) {
        Some(Value::String(identifier)) if !identifier.is_empty() => Ok(identifier.clone()),
        Some(Value::Number(identifier)) => Ok(identifier.to_string()),
        Some(_) => Err(SearchError::validation(format!(
            "Identifier \"{}\" must be a non empty string or a number",
            name
        ))),
        None => Err(SearchError::validation(format!(
            "Document for index \"{}\" has no identifier \"{}\"",
            index.name, name
        ))),
    }
}

/// Attach highlighted fragments under [`FORMATTED_KEY`].
///
/// `lookup` returns the backend's fragment for a field. A requested field
/// without a fragment is an error: the backend was asked for it and did not
/// deliver.
pub fn attach_highlights(
    mut document: Document,
    fields: &[String],
    lookup: impl Fn(&str) -> Option<Value>,
) -> Result<Document, SearchError> {
    if fields.is_empty() {
        return Ok(document);
    }

    let mut formatted = match document.remove(FORMATTED_KEY) {
        Some(Value::Object(existing)) => existing,
        _ => Map::new(),
    };

    for field in fields {
        let fragment = lookup(field).ok_or_else(|| SearchError::missing_highlight(field))?;
        formatted.insert(field.clone(), fragment);
    }

    document.insert(FORMATTED_KEY.to_string(), Value::Object(formatted));
    Ok(document)
}

/// Resolve the value a filter on `path` compares against.
///
/// Fails for paths the index does not declare. With `date_as_integer`,
/// date strings compared against a date field become Unix timestamps so
/// they match what the marshaller stored.
pub fn filter_literal(
    index: &Index,
    path: &str,
    value: &FilterValue,
    date_as_integer: bool,
) -> Result<Value, SearchError> {
    let field = index
        .field_by_path(path)
        .ok_or_else(|| SearchError::validation(format!("Unknown field \"{}\"", path)))?;

    match value {
        FilterValue::String(date) if date_as_integer && field.kind() == FieldKind::DateTime => {
            Ok(Value::from(date_to_timestamp(path, date)?))
        }
        other => Ok(other.to_json()),
    }
}

/// Render a value for string based filter languages.
///
/// Strings are double quoted with every character in `escaped` prefixed by
/// a backslash, booleans and numbers are written as is.
pub fn quote_filter_value(value: &Value, escaped: &[char]) -> String {
    match value {
        Value::String(s) => {
            let mut quoted = String::with_capacity(s.len() + 2);
            quoted.push('"');
            for c in s.chars() {
                if escaped.contains(&c) {
                    quoted.push('\\');
                }
                quoted.push(c);
            }
            quoted.push('"');
            quoted
        }
        other => other.to_string(),
    }
}
