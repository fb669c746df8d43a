//! Schema validation errors.
//!
//! Every error in here is raised while the schema is being constructed (or
//! while a search request is being frozen) and is never recoverable at
//! runtime: it always points at a programming or configuration mistake.

use thiserror::Error;

/// Errors raised while building fields, indexes, schemas or search requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The index declares no identifier field.
    #[error("Index \"{index}\" has no identifier field")]
    MissingIdentifier { index: String },

    /// The index declares more than one identifier field.
    #[error("Index \"{index}\" declares more than one identifier field: {fields:?}")]
    DuplicateIdentifier { index: String, fields: Vec<String> },

    /// An identifier field was declared below the index root.
    #[error("Identifier field \"{field}\" must be declared at the index root")]
    NestedIdentifier { field: String },

    /// A geo point field was declared with a capability it cannot support.
    #[error("Geo point field \"{field}\" cannot be {capability}")]
    InvalidGeoPoint { field: String, capability: String },

    /// A typed field declares no types.
    #[error("Typed field \"{field}\" must declare at least one type")]
    EmptyTypes { field: String },

    /// A typed field declares a type with an empty name or has no discriminator.
    #[error("Typed field \"{field}\" has an invalid type definition: {reason}")]
    InvalidTypedField { field: String, reason: String },

    /// The same field name appears twice on one level of the tree.
    #[error("Field \"{field}\" is declared more than once")]
    DuplicateField { field: String },

    /// Two indexes share a name inside one schema.
    #[error("Index \"{0}\" is declared more than once")]
    DuplicateIndex(String),

    /// The requested index does not exist in the schema.
    #[error("Index \"{0}\" not found")]
    UnknownIndex(String),

    /// A search request was built without selecting an index.
    #[error("No index selected for the search")]
    NoIndexSelected,
}

impl SchemaError {
    /// Create an invalid geo point error.
    pub fn invalid_geo_point(field: impl Into<String>, capability: impl Into<String>) -> Self {
        Self::InvalidGeoPoint {
            field: field.into(),
            capability: capability.into(),
        }
    }

    /// Create an invalid typed field error.
    pub fn invalid_typed_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTypedField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
