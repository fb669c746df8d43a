//! Field type system.
//!
//! A [`Field`] is a typed node of an index's schema tree. Leaf variants hold
//! scalar values, while [`FieldType::Object`] and [`FieldType::Typed`] carry
//! sub-trees. Every field has four independent capability flags and a
//! `multiple` flag marking sequence values.

use serde::{Deserialize, Serialize};

use crate::errors::SchemaError;

/// The shape of a field's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldType {
    /// The unique document key. Exactly one per index.
    Identifier,
    Text,
    Boolean,
    Integer,
    Float,
    /// An RFC 3339 timestamp string.
    DateTime,
    /// A `{"latitude": .., "longitude": ..}` pair.
    GeoPoint,
    /// A named sub-tree of fields.
    Object { fields: Vec<Field> },
    /// A discriminated union: the value of `type_field` selects the sub-tree.
    Typed {
        type_field: String,
        types: Vec<TypedVariant>,
    },
}

/// One alternative of a typed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedVariant {
    /// Discriminator value selecting this variant.
    pub name: String,
    pub fields: Vec<Field>,
}

/// Data-less discriminant of [`FieldType`], used for per-kind policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Identifier,
    Text,
    Boolean,
    Integer,
    Float,
    DateTime,
    GeoPoint,
    Object,
    Typed,
}

impl FieldType {
    /// Returns the discriminant of this field type.
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldType::Identifier => FieldKind::Identifier,
            FieldType::Text => FieldKind::Text,
            FieldType::Boolean => FieldKind::Boolean,
            FieldType::Integer => FieldKind::Integer,
            FieldType::Float => FieldKind::Float,
            FieldType::DateTime => FieldKind::DateTime,
            FieldType::GeoPoint => FieldKind::GeoPoint,
            FieldType::Object { .. } => FieldKind::Object,
            FieldType::Typed { .. } => FieldKind::Typed,
        }
    }
}

/// A typed node in an index's schema tree.
///
/// Fields are created through the named constructors and refined with the
/// flag setters:
///
/// ```
/// use search_layer_shared::Field;
///
/// let price = Field::float("price").filterable(true).sortable(true);
/// assert!(price.filterable);
/// assert!(!price.searchable);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    /// The value is a sequence rather than a scalar.
    pub multiple: bool,
    pub searchable: bool,
    pub filterable: bool,
    pub sortable: bool,
    pub facet: bool,
}

impl Field {
    fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            multiple: false,
            searchable: false,
            filterable: false,
            sortable: false,
            facet: false,
        }
    }

    /// Create the identifier field. Filterable and sortable by default.
    pub fn identifier(name: impl Into<String>) -> Self {
        Self {
            filterable: true,
            sortable: true,
            ..Self::new(name, FieldType::Identifier)
        }
    }

    /// Create a text field. Searchable by default.
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            searchable: true,
            ..Self::new(name, FieldType::Text)
        }
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Float)
    }

    pub fn date_time(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::DateTime)
    }

    /// Create a geo point field. It can never be searchable or a facet.
    pub fn geo_point(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::GeoPoint)
    }

    /// Create an object field holding the given sub-tree.
    pub fn object(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self::new(name, FieldType::Object { fields })
    }

    /// Create a typed field.
    ///
    /// `types` maps each discriminator value to the sub-tree it selects.
    pub fn typed<N: Into<String>>(
        name: impl Into<String>,
        type_field: impl Into<String>,
        types: Vec<(N, Vec<Field>)>,
    ) -> Self {
        let types = types
            .into_iter()
            .map(|(name, fields)| TypedVariant {
                name: name.into(),
                fields,
            })
            .collect();

        Self::new(
            name,
            FieldType::Typed {
                type_field: type_field.into(),
                types,
            },
        )
    }

    pub fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn facet(mut self, facet: bool) -> Self {
        self.facet = facet;
        self
    }

    /// Returns the discriminant of this field's type.
    pub fn kind(&self) -> FieldKind {
        self.field_type.kind()
    }

    /// Returns true for object and typed fields.
    pub fn is_compound(&self) -> bool {
        matches!(
            self.field_type,
            FieldType::Object { .. } | FieldType::Typed { .. }
        )
    }

    /// Looks up a typed field's variant by discriminator value.
    pub fn variant(&self, type_name: &str) -> Option<&TypedVariant> {
        match &self.field_type {
            FieldType::Typed { types, .. } => types.iter().find(|t| t.name == type_name),
            _ => None,
        }
    }

    /// Validate this field and its sub-tree.
    ///
    /// Identifier fields are only accepted when `allow_identifier` is set,
    /// which the index does for its root level.
    pub(crate) fn validate(&self, allow_identifier: bool) -> Result<(), SchemaError> {
        match &self.field_type {
            FieldType::Identifier if !allow_identifier => Err(SchemaError::NestedIdentifier {
                field: self.name.clone(),
            }),
            FieldType::GeoPoint if self.searchable => {
                Err(SchemaError::invalid_geo_point(&self.name, "searchable"))
            }
            FieldType::GeoPoint if self.facet => {
                Err(SchemaError::invalid_geo_point(&self.name, "a facet"))
            }
            FieldType::Object { fields } => validate_level(fields, false),
            FieldType::Typed { type_field, types } => {
                if types.is_empty() {
                    return Err(SchemaError::EmptyTypes {
                        field: self.name.clone(),
                    });
                }
                if type_field.is_empty() {
                    return Err(SchemaError::invalid_typed_field(
                        &self.name,
                        "discriminator field name is empty",
                    ));
                }

                let mut seen: Vec<&str> = Vec::with_capacity(types.len());
                for variant in types {
                    if variant.name.is_empty() {
                        return Err(SchemaError::invalid_typed_field(
                            &self.name,
                            "type name is empty",
                        ));
                    }
                    if seen.contains(&variant.name.as_str()) {
                        return Err(SchemaError::invalid_typed_field(
                            &self.name,
                            format!("type \"{}\" is declared more than once", variant.name),
                        ));
                    }
                    seen.push(&variant.name);
                    validate_level(&variant.fields, false)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Validate one level of a field tree: unique names, then each field.
pub(crate) fn validate_level(fields: &[Field], allow_identifier: bool) -> Result<(), SchemaError> {
    for (position, field) in fields.iter().enumerate() {
        if fields[..position].iter().any(|f| f.name == field.name) {
            return Err(SchemaError::DuplicateField {
                field: field.name.clone(),
            });
        }
        field.validate(allow_identifier)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags() {
        let id = Field::identifier("id");
        assert!(id.filterable && id.sortable && !id.searchable);

        let title = Field::text("title");
        assert!(title.searchable && !title.filterable && !title.sortable);

        let count = Field::integer("count");
        assert!(!count.searchable && !count.multiple);
    }

    #[test]
    fn test_geo_point_rejects_searchable() {
        let field = Field::geo_point("location").searchable(true);
        assert_eq!(
            field.validate(true),
            Err(SchemaError::invalid_geo_point("location", "searchable"))
        );
    }

    #[test]
    fn test_geo_point_rejects_facet() {
        let field = Field::geo_point("location").facet(true);
        assert!(matches!(
            field.validate(true),
            Err(SchemaError::InvalidGeoPoint { .. })
        ));
    }

    #[test]
    fn test_geo_point_accepts_filterable_and_sortable() {
        let field = Field::geo_point("location").filterable(true).sortable(true);
        assert!(field.validate(true).is_ok());
    }

    #[test]
    fn test_typed_field_requires_types() {
        let field = Field::typed::<&str>("blocks", "type", vec![]);
        assert_eq!(
            field.validate(false),
            Err(SchemaError::EmptyTypes {
                field: "blocks".to_string()
            })
        );
    }

    #[test]
    fn test_typed_field_rejects_empty_type_name() {
        let field = Field::typed("blocks", "type", vec![("", vec![Field::text("title")])]);
        assert!(matches!(
            field.validate(false),
            Err(SchemaError::InvalidTypedField { .. })
        ));
    }

    #[test]
    fn test_typed_field_rejects_duplicate_type() {
        let field = Field::typed(
            "blocks",
            "type",
            vec![
                ("text", vec![Field::text("title")]),
                ("text", vec![Field::text("body")]),
            ],
        );
        assert!(matches!(
            field.validate(false),
            Err(SchemaError::InvalidTypedField { .. })
        ));
    }

    #[test]
    fn test_nested_identifier_rejected() {
        let field = Field::object("footer", vec![Field::identifier("id")]);
        assert_eq!(
            field.validate(false),
            Err(SchemaError::NestedIdentifier {
                field: "id".to_string()
            })
        );
    }

    #[test]
    fn test_duplicate_child_rejected() {
        let field = Field::object("footer", vec![Field::text("title"), Field::text("title")]);
        assert!(matches!(
            field.validate(false),
            Err(SchemaError::DuplicateField { .. })
        ));
    }

    #[test]
    fn test_variant_lookup() {
        let field = Field::typed(
            "header",
            "type",
            vec![
                ("image", vec![Field::integer("media")]),
                ("video", vec![Field::text("media")]),
            ],
        );
        assert_eq!(
            field.variant("video").map(|v| v.fields[0].kind()),
            Some(FieldKind::Text)
        );
        assert!(field.variant("audio").is_none());
        assert!(field.is_compound());
    }
}
