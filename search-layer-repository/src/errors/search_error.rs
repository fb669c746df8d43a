//! Search layer error types.
//!
//! This module defines the unified error type for all search layer
//! operations, from schema and marshalling failures raised before any
//! backend call to I/O errors reported by the backend itself.

use search_layer_shared::SchemaError;
use thiserror::Error;

/// Unified errors from search layer operations.
///
/// Used by the adapter traits, both marshallers, the composite adapters and
/// `Engine`. The type is `Clone` so per-item failures can be stored in a
/// `BatchOperationSummary`.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// Validation error (e.g., document without identifier).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Invalid schema or search request.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// The index is not part of the engine's schema.
    #[error("Index \"{0}\" not found")]
    UnknownIndex(String),

    /// No engine is registered under the given name.
    #[error("Engine \"{0}\" not found")]
    UnknownEngine(String),

    /// A typed field element carries a discriminator value that is not declared.
    #[error("Type \"{type_name}\" not found. Existing types are {}", quoted(.known))]
    UnknownType {
        type_name: String,
        known: Vec<String>,
    },

    /// A document does not fit the field tree it is marshalled with.
    #[error("Marshalling error: {0}")]
    MarshallingError(String),

    /// The backend cannot express a condition.
    #[error("Unsupported condition: {0}")]
    UnsupportedCondition(String),

    /// The backend cannot express the requested sort.
    #[error("Unsupported sort: {0}")]
    UnsupportedSort(String),

    /// A page based backend was asked for an offset that is not a page boundary.
    #[error("Offset {offset} is not a multiple of limit {limit}, pagination would lose precision")]
    PaginationPrecision { offset: usize, limit: usize },

    /// The backend returned a hit without the requested highlight.
    #[error("Expected highlight for field \"{field}\"")]
    MissingHighlight { field: String },

    /// Failed to establish connection to the search backend.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The backend rejected a request.
    #[error("Backend error: {0}")]
    BackendError(String),

    /// Failed to parse a response from the search backend.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the search backend.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Document not found.
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Batch size exceeds configured maximum.
    #[error("Batch size {provided} exceeds maximum {max}")]
    BatchSizeExceeded { provided: usize, max: usize },

    /// A pending backend task failed.
    #[error("Task error: {0}")]
    TaskError(String),

    /// Invalid adapter or engine configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

fn quoted(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("\"{}\"", v))
        .collect::<Vec<_>>()
        .join(", ")
}

impl SearchError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn unknown_index(name: impl Into<String>) -> Self {
        Self::UnknownIndex(name.into())
    }

    pub fn unknown_engine(name: impl Into<String>) -> Self {
        Self::UnknownEngine(name.into())
    }

    /// Create an unknown type error.
    pub fn unknown_type(type_name: impl Into<String>, known: Vec<String>) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
            known,
        }
    }

    /// Create a marshalling error.
    pub fn marshalling(msg: impl Into<String>) -> Self {
        Self::MarshallingError(msg.into())
    }

    /// Create an unsupported condition error.
    pub fn unsupported_condition(msg: impl Into<String>) -> Self {
        Self::UnsupportedCondition(msg.into())
    }

    /// Create an unsupported sort error.
    pub fn unsupported_sort(msg: impl Into<String>) -> Self {
        Self::UnsupportedSort(msg.into())
    }

    /// Create a pagination precision error.
    pub fn pagination_precision(offset: usize, limit: usize) -> Self {
        Self::PaginationPrecision { offset, limit }
    }

    /// Create a missing highlight error.
    pub fn missing_highlight(field: impl Into<String>) -> Self {
        Self::MissingHighlight {
            field: field.into(),
        }
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::BackendError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a document not found error.
    pub fn document_not_found(index: &str, identifier: &str) -> Self {
        Self::DocumentNotFound(format!("index={}, identifier={}", index, identifier))
    }

    /// Create a batch size exceeded error.
    pub fn batch_size_exceeded(provided: usize, max: usize) -> Self {
        Self::BatchSizeExceeded { provided, max }
    }

    /// Create a task error.
    pub fn task(msg: impl Into<String>) -> Self {
        Self::TaskError(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_message() {
        let err = SearchError::unknown_type("gallery", vec!["text".to_string(), "embed".to_string()]);
        assert_eq!(
            err.to_string(),
            "Type \"gallery\" not found. Existing types are \"text\", \"embed\""
        );
    }

    #[test]
    fn test_schema_error_conversion() {
        let err: SearchError = SchemaError::NoIndexSelected.into();
        assert!(matches!(err, SearchError::Schema(SchemaError::NoIndexSelected)));
    }

    #[test]
    fn test_pagination_precision_message() {
        let err = SearchError::pagination_precision(7, 5);
        assert_eq!(
            err.to_string(),
            "Offset 7 is not a multiple of limit 5, pagination would lose precision"
        );
    }
}
