//! Index definition.
//!
//! An [`Index`] is a validated, ordered field tree with a name. Declaration
//! order is preserved everywhere since some backends derive their column
//! order from it.

use serde::Serialize;

use crate::errors::SchemaError;
use crate::types::field::{validate_level, Field, FieldKind, FieldType};

/// A named, validated field tree describing one backend collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Index {
    pub name: String,
    pub fields: Vec<Field>,
}

impl Index {
    /// Create a new index, validating its field tree.
    ///
    /// # Arguments
    ///
    /// * `name` - The backend collection name
    /// * `fields` - The root level fields in declaration order
    ///
    /// # Returns
    ///
    /// * `Ok(Index)` - When exactly one root identifier is declared and every
    ///   field passes validation
    /// * `Err(SchemaError)` - Otherwise
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Result<Self, SchemaError> {
        let name = name.into();

        validate_level(&fields, true)?;

        let identifiers: Vec<String> = fields
            .iter()
            .filter(|f| f.kind() == FieldKind::Identifier)
            .map(|f| f.name.clone())
            .collect();

        match identifiers.len() {
            0 => Err(SchemaError::MissingIdentifier { index: name }),
            1 => Ok(Self { name, fields }),
            _ => Err(SchemaError::DuplicateIdentifier {
                index: name,
                fields: identifiers,
            }),
        }
    }

    /// Returns the identifier field of this index.
    pub fn identifier_field(&self) -> &Field {
        // Index::new guarantees exactly one root identifier.
        self.fields
            .iter()
            .find(|f| f.kind() == FieldKind::Identifier)
            .unwrap_or(&self.fields[0])
    }

    /// Returns a root level field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Resolve a dotted path such as `blocks.text.title` to its field.
    ///
    /// Object fields consume one segment; typed fields consume two, the
    /// discriminator value followed by the child name.
    pub fn field_by_path(&self, path: &str) -> Option<&Field> {
        let mut segments = path.split('.');
        let mut current = self.field(segments.next()?)?;

        while let Some(segment) = segments.next() {
            current = match &current.field_type {
                FieldType::Object { fields } => fields.iter().find(|f| f.name == segment)?,
                FieldType::Typed { .. } => {
                    let variant = current.variant(segment)?;
                    let child = segments.next()?;
                    variant.fields.iter().find(|f| f.name == child)?
                }
                _ => return None,
            };
        }

        Some(current)
    }

    /// Dotted paths of every searchable leaf, in declaration order.
    pub fn searchable_fields(&self) -> Vec<String> {
        self.collect_paths(|f| f.searchable)
    }

    /// Dotted paths of every filterable leaf, in declaration order.
    pub fn filterable_fields(&self) -> Vec<String> {
        self.collect_paths(|f| f.filterable)
    }

    /// Dotted paths of every sortable leaf, in declaration order.
    pub fn sortable_fields(&self) -> Vec<String> {
        self.collect_paths(|f| f.sortable)
    }

    fn collect_paths(&self, predicate: impl Fn(&Field) -> bool + Copy) -> Vec<String> {
        let mut paths = Vec::new();
        collect_level(&self.fields, "", predicate, &mut paths);
        paths
    }
}

fn collect_level(
    fields: &[Field],
    prefix: &str,
    predicate: impl Fn(&Field) -> bool + Copy,
    paths: &mut Vec<String>,
) {
    for field in fields {
        let path = format!("{}{}", prefix, field.name);
        match &field.field_type {
            FieldType::Object { fields } => {
                collect_level(fields, &format!("{}.", path), predicate, paths)
            }
            FieldType::Typed { types, .. } => {
                for variant in types {
                    collect_level(
                        &variant.fields,
                        &format!("{}.{}.", path, variant.name),
                        predicate,
                        paths,
                    );
                }
            }
            _ if predicate(field) => paths.push(path),
            _ => {}
        }
    }
}
