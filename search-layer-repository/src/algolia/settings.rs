//! Algolia index settings.
//!
//! Algolia sorts through replica indexes ranked by a single attribute, so
//! every sortable field gets an ascending and a descending replica named
//! `<index>__<field>_<direction>`.

use search_layer_shared::{FieldKind, Index, SortDirection};
use serde_json::{json, Value};

/// Default Algolia ranking criteria following the sort attribute.
const RANKING: [&str; 8] = [
    "typo",
    "geo",
    "words",
    "filters",
    "proximity",
    "attribute",
    "exact",
    "custom",
];

/// Name of the replica sorted by `field` in `direction`. Dots in nested
/// paths become underscores.
pub fn replica_name(index: &str, field: &str, direction: SortDirection) -> String {
    format!("{}__{}_{}", index, field.replace('.', "_"), direction.as_str())
}

/// Settings of the primary index.
pub fn index_settings(index: &Index) -> Value {
    let faceting: Vec<String> = index
        .filterable_fields()
        .into_iter()
        .filter(|path| {
            index
                .field_by_path(path)
                .is_some_and(|field| field.kind() != FieldKind::GeoPoint)
        })
        .map(|path| format!("filterOnly({})", path))
        .collect();

    let replicas: Vec<String> = replicas(index).into_iter().map(|(name, _)| name).collect();

    json!({
        "searchableAttributes": index.searchable_fields(),
        "attributesForFaceting": faceting,
        "replicas": replicas,
    })
}

/// Every sort replica of an index with its settings.
pub fn replicas(index: &Index) -> Vec<(String, Value)> {
    let mut replicas = Vec::new();
    for field in index.sortable_fields() {
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let mut ranking = vec![format!("{}({})", direction.as_str(), field)];
            ranking.extend(RANKING.iter().map(|criterion| criterion.to_string()));

            replicas.push((
                replica_name(&index.name, &field, direction),
                json!({ "ranking": ranking }),
            ));
        }
    }
    replicas
}
