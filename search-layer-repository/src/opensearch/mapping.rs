//! OpenSearch index mappings.
//!
//! This module derives a strict index mapping from an index's field tree.

use search_layer_shared::{Field, FieldType, Index};
use serde_json::{json, Map, Value};

use crate::marshaller::ORIGINAL_INDEX_KEY;

/// Get the index body (settings and mappings) for an index.
///
/// The mapping is `strict`, so documents with undeclared keys are rejected
/// by the backend. It includes:
/// - **keyword** for identifiers, and a `raw` keyword sub-field on text
///   fields that are filterable or sortable
/// - **object** properties for object fields, one object per type for typed
///   fields (with an `_originalIndex` integer when the field is multiple)
/// - **geo_point** for geo fields
pub fn index_body(index: &Index) -> Value {
    json!({
        "mappings": {
            "dynamic": "strict",
            "properties": properties(&index.fields),
        }
    })
}

fn properties(fields: &[Field]) -> Value {
    let mut mapped = Map::new();

    for field in fields {
        let indexed = field.searchable || field.filterable;
        let doc_values = field.filterable || field.sortable;

        let mapping = match &field.field_type {
            FieldType::Identifier => keyword(indexed, doc_values),
            FieldType::Text => {
                let mut text = json!({ "type": "text", "index": indexed });
                if field.filterable || field.sortable {
                    text["fields"] = json!({ "raw": keyword(indexed, doc_values) });
                }
                text
            }
            FieldType::Boolean => scalar("boolean", indexed, doc_values),
            FieldType::DateTime => scalar("date", indexed, doc_values),
            FieldType::Integer => scalar("integer", indexed, doc_values),
            FieldType::Float => scalar("float", indexed, doc_values),
            FieldType::GeoPoint => json!({
                "type": "geo_point",
                "index": field.filterable,
                "doc_values": doc_values,
            }),
            FieldType::Object { fields } => json!({
                "type": "object",
                "properties": properties(fields),
            }),
            FieldType::Typed { types, .. } => {
                let mut typed = Map::new();
                for variant in types {
                    let mut variant_properties = properties(&variant.fields);
                    if field.multiple {
                        variant_properties[ORIGINAL_INDEX_KEY] =
                            json!({ "type": "integer", "index": false });
                    }
                    typed.insert(
                        variant.name.clone(),
                        json!({ "type": "object", "properties": variant_properties }),
                    );
                }
                json!({ "type": "object", "properties": typed })
            }
        };

        mapped.insert(field.name.clone(), mapping);
    }

    Value::Object(mapped)
}

fn keyword(indexed: bool, doc_values: bool) -> Value {
    scalar("keyword", indexed, doc_values)
}

fn scalar(kind: &str, indexed: bool, doc_values: bool) -> Value {
    json!({ "type": kind, "index": indexed, "doc_values": doc_values })
}
