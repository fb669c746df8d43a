//! Search request and builder.
//!
//! A [`Search`] is the immutable request handed to an adapter. It is
//! assembled through a [`SearchBuilder`]:
//!
//! ```
//! use std::sync::Arc;
//! use search_layer_shared::{Condition, Field, Index, Schema, SearchBuilder, SortDirection};
//!
//! let schema = Arc::new(
//!     Schema::new(vec![Index::new(
//!         "products",
//!         vec![Field::identifier("id"), Field::float("price").filterable(true).sortable(true)],
//!     )
//!     .unwrap()])
//!     .unwrap(),
//! );
//!
//! let search = SearchBuilder::new(schema)
//!     .index("products")
//!     .add_filter(Condition::greater_than_equal("price", 10))
//!     .add_sort_by("price", SortDirection::Asc)
//!     .limit(2)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(search.index.name, "products");
//! assert_eq!(search.offset, 0);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::SchemaError;
use crate::types::condition::Condition;
use crate::types::index::Index;
use crate::types::schema::Schema;

pub const DEFAULT_HIGHLIGHT_PRE_TAG: &str = "<mark>";
pub const DEFAULT_HIGHLIGHT_POST_TAG: &str = "</mark>";

/// Sort direction of a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable search request.
#[derive(Debug, Clone, PartialEq)]
pub struct Search {
    /// Target index.
    pub index: Arc<Index>,
    /// Top level conditions, implicitly combined with AND.
    pub filters: Vec<Condition>,
    /// Sort keys in priority order. A field appears at most once.
    pub sort_by: Vec<(String, SortDirection)>,
    pub limit: Option<usize>,
    pub offset: usize,
    pub highlight_fields: Vec<String>,
    pub highlight_pre_tag: String,
    pub highlight_post_tag: String,
}

impl Search {
    /// Create an unfiltered request against an index.
    pub fn new(index: Arc<Index>) -> Self {
        Self {
            index,
            filters: Vec::new(),
            sort_by: Vec::new(),
            limit: None,
            offset: 0,
            highlight_fields: Vec::new(),
            highlight_pre_tag: DEFAULT_HIGHLIGHT_PRE_TAG.to_string(),
            highlight_post_tag: DEFAULT_HIGHLIGHT_POST_TAG.to_string(),
        }
    }

    /// Returns the identifier when this request is a single document
    /// lookup: one identifier filter, offset 0 and limit 1.
    pub fn single_document_lookup(&self) -> Option<&str> {
        match self.filters.as_slice() {
            [Condition::Identifier(identifier)] if self.offset == 0 && self.limit == Some(1) => {
                Some(identifier)
            }
            _ => None,
        }
    }
}

/// Accumulates the parts of a [`Search`].
///
/// Scalar setters overwrite, `add_filter` appends and `add_sort_by`
/// appends or replaces the direction of an already present field.
/// [`SearchBuilder::build`] leaves the accumulated state untouched.
#[derive(Debug, Clone)]
pub struct SearchBuilder {
    schema: Arc<Schema>,
    index: Option<String>,
    filters: Vec<Condition>,
    sort_by: Vec<(String, SortDirection)>,
    limit: Option<usize>,
    offset: usize,
    highlight_fields: Vec<String>,
    highlight_pre_tag: String,
    highlight_post_tag: String,
}

impl SearchBuilder {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            index: None,
            filters: Vec::new(),
            sort_by: Vec::new(),
            limit: None,
            offset: 0,
            highlight_fields: Vec::new(),
            highlight_pre_tag: DEFAULT_HIGHLIGHT_PRE_TAG.to_string(),
            highlight_post_tag: DEFAULT_HIGHLIGHT_POST_TAG.to_string(),
        }
    }

    /// Select the target index. Resolved against the schema on build.
    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index = Some(name.into());
        self
    }

    pub fn add_filter(mut self, condition: Condition) -> Self {
        self.filters.push(condition);
        self
    }

    pub fn add_sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        let field = field.into();
        match self.sort_by.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = direction,
            None => self.sort_by.push((field, direction)),
        }
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Request highlighted fragments for `fields`, wrapped in the given tags.
    pub fn highlight<S: Into<String>>(
        mut self,
        fields: Vec<S>,
        pre_tag: impl Into<String>,
        post_tag: impl Into<String>,
    ) -> Self {
        self.highlight_fields = fields.into_iter().map(Into::into).collect();
        self.highlight_pre_tag = pre_tag.into();
        self.highlight_post_tag = post_tag.into();
        self
    }

    /// Freeze the accumulated state into a [`Search`].
    pub fn build(&self) -> Result<Search, SchemaError> {
        let name = self.index.as_deref().ok_or(SchemaError::NoIndexSelected)?;
        let index = self
            .schema
            .index(name)
            .ok_or_else(|| SchemaError::UnknownIndex(name.to_string()))?;

        Ok(Search {
            index,
            filters: self.filters.clone(),
            sort_by: self.sort_by.clone(),
            limit: self.limit,
            offset: self.offset,
            highlight_fields: self.highlight_fields.clone(),
            highlight_pre_tag: self.highlight_pre_tag.clone(),
            highlight_post_tag: self.highlight_post_tag.clone(),
        })
    }
}
