//! # Search Layer Shared
//!
//! This crate defines the backend-neutral data model of the search layer:
//! the field type system, indexes and schemas, the condition algebra used to
//! express filters, and the immutable search request produced by the
//! [`SearchBuilder`].
//!
//! Nothing in here performs I/O. Adapters living in `search-layer-repository`
//! consume these types and compile them into each backend's native query.

pub mod errors;
pub mod types;

pub use errors::SchemaError;
pub use types::condition::{Condition, FilterValue};
pub use types::document::Document;
pub use types::field::{Field, FieldKind, FieldType, TypedVariant};
pub use types::index::Index;
pub use types::schema::Schema;
pub use types::search::{
    Search, SearchBuilder, SortDirection, DEFAULT_HIGHLIGHT_POST_TAG, DEFAULT_HIGHLIGHT_PRE_TAG,
};
