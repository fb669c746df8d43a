//! Typesense collection schemas.

use search_layer_shared::{Field, FieldType, Index};
use serde_json::{json, Value};

/// Build the collection schema of an index.
///
/// Nested fields are declared with their dotted path next to an `object`
/// parent. A leaf below a multiple ancestor is itself an array.
pub fn collection_schema(index: &Index) -> Value {
    let mut fields = Vec::new();
    collect_fields(&index.fields, "", false, &mut fields);

    json!({
        "name": index.name,
        "fields": fields,
        "enable_nested_fields": true,
    })
}

fn collect_fields(fields: &[Field], prefix: &str, parent_multiple: bool, out: &mut Vec<Value>) {
    for field in fields {
        let path = format!("{}{}", prefix, field.name);
        let multiple = parent_multiple || field.multiple;

        match &field.field_type {
            FieldType::Object { fields: children } => {
                out.push(json!({ "name": path, "type": array_of("object", multiple), "optional": true }));
                collect_fields(children, &format!("{}.", path), multiple, out);
            }
            FieldType::Typed { types, .. } => {
                out.push(json!({ "name": path, "type": "object", "optional": true }));
                for variant in types {
                    let variant_path = format!("{}.{}", path, variant.name);
                    out.push(json!({
                        "name": variant_path,
                        "type": array_of("object", multiple),
                        "optional": true,
                    }));
                    collect_fields(&variant.fields, &format!("{}.", variant_path), multiple, out);
                }
            }
            // Typesense declares the document id implicitly
            FieldType::Identifier if field.name == "id" && prefix.is_empty() => {}
            leaf => {
                let kind = match leaf {
                    FieldType::Identifier | FieldType::Text => "string",
                    FieldType::Boolean => "bool",
                    FieldType::Integer | FieldType::DateTime => "int64",
                    FieldType::Float => "float",
                    FieldType::GeoPoint => "geopoint",
                    FieldType::Object { .. } | FieldType::Typed { .. } => "object",
                };

                out.push(json!({
                    "name": path,
                    "type": array_of(kind, multiple),
                    "index": field.searchable || field.filterable || field.sortable,
                    "facet": (field.filterable || field.facet) && !matches!(leaf, FieldType::GeoPoint),
                    "sort": field.sortable,
                    "optional": true,
                }));
            }
        }
    }
}

fn array_of(kind: &str, multiple: bool) -> String {
    if multiple {
        format!("{}[]", kind)
    } else {
        kind.to_string()
    }
}
