//! Schema: the set of indexes known to an engine.

use std::sync::Arc;

use crate::errors::SchemaError;
use crate::types::index::Index;

/// A named collection of indexes.
///
/// Built once at startup and shared by reference across every engine; the
/// indexes are held behind [`Arc`] so search requests can keep a handle on
/// their target index without borrowing the schema.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    indexes: Vec<Arc<Index>>,
}

impl Schema {
    /// Create a schema from its indexes, rejecting duplicate names.
    pub fn new(indexes: Vec<Index>) -> Result<Self, SchemaError> {
        let mut schema = Self::default();
        for index in indexes {
            if schema.index(&index.name).is_some() {
                return Err(SchemaError::DuplicateIndex(index.name));
            }
            schema.indexes.push(Arc::new(index));
        }
        Ok(schema)
    }

    /// Look up an index by name.
    pub fn index(&self, name: &str) -> Option<Arc<Index>> {
        self.indexes.iter().find(|i| i.name == name).cloned()
    }

    /// Iterate over the indexes in declaration order.
    pub fn indexes(&self) -> impl Iterator<Item = &Arc<Index>> {
        self.indexes.iter()
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::field::Field;

    fn index(name: &str) -> Index {
        Index::new(name, vec![Field::identifier("id")]).unwrap()
    }

    #[test]
    fn test_lookup_and_order() {
        let schema = Schema::new(vec![index("news"), index("blog")]).unwrap();

        assert_eq!(schema.len(), 2);
        assert!(schema.index("blog").is_some());
        assert!(schema.index("pages").is_none());

        let names: Vec<&str> = schema.indexes().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["news", "blog"]);
    }

    #[test]
    fn test_duplicate_index() {
        let result = Schema::new(vec![index("news"), index("news")]);
        assert_eq!(
            result.unwrap_err(),
            SchemaError::DuplicateIndex("news".to_string())
        );
    }
}
