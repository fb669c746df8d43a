//! This module defines the core data structures of the search layer.
//! It re-exports the field, index, schema, condition and search types.

pub mod condition;
pub mod document;
pub mod field;
pub mod index;
pub mod schema;
pub mod search;

pub use condition::{Condition, FilterValue};
pub use document::Document;
pub use field::{Field, FieldKind, FieldType, TypedVariant};
pub use index::Index;
pub use schema::Schema;
pub use search::{Search, SearchBuilder, SortDirection};
