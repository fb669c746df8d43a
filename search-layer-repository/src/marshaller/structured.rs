//! Structure preserving marshaller.
//!
//! Used by backends that index nested objects natively. The document tree
//! is kept; only geo points, typed fields and (optionally) dates are
//! rewritten into the backend's conventions, and reversed on the way back.

use search_layer_shared::{Document, Field, FieldType};
use serde_json::{Map, Value};

use crate::errors::SearchError;
use crate::marshaller::{date_to_timestamp, map_values, timestamp_to_date};

/// Key recording the position of a typed element inside its sequence.
pub const ORIGINAL_INDEX_KEY: &str = "_originalIndex";

/// Suffix of the key keeping a date's original text next to its timestamp.
pub const ORIGINAL_DATE_SUFFIX: &str = "__original";

/// Key holding the original text of the date field `name`.
pub fn original_date_key(name: &str) -> String {
    format!("{}{}", name, ORIGINAL_DATE_SUFFIX)
}

/// Where a coordinate lives inside a stored geo point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoKey {
    /// A named key of an object, e.g. `lat`.
    Key(String),
    /// A position inside a `[lat, lng]` style sequence.
    Position(usize),
}

/// Storage convention for geo point fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoPointConfig {
    /// Store every geo point under this key instead of the field name.
    pub name: Option<String>,
    pub latitude: GeoKey,
    pub longitude: GeoKey,
}

impl Default for GeoPointConfig {
    fn default() -> Self {
        Self::keys("latitude", "longitude")
    }
}

impl GeoPointConfig {
    /// Store geo points as an object with the given coordinate keys.
    pub fn keys(latitude: impl Into<String>, longitude: impl Into<String>) -> Self {
        Self {
            name: None,
            latitude: GeoKey::Key(latitude.into()),
            longitude: GeoKey::Key(longitude.into()),
        }
    }

    /// Store geo points as a `[latitude, longitude]` pair.
    pub fn positional() -> Self {
        Self {
            name: None,
            latitude: GeoKey::Position(0),
            longitude: GeoKey::Position(1),
        }
    }

    /// Store geo points under `name` instead of the field name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Converts documents into the backend's nested representation and back.
///
/// Typed fields are regrouped by discriminator value so that each variant
/// lives under its own key: `{"type": "text", "title": ..}` is stored as
/// `{"text": {"title": ..}}`, and a multiple typed field as
/// `{"text": [{"title": .., "_originalIndex": 0}]}` so the original order
/// can be restored.
///
/// With `date_as_integer`, a date is stored as Unix seconds and its original
/// text is kept under [`original_date_key`], so offsets and date-only values
/// come back exactly as they went in.
#[derive(Debug, Clone, Default)]
pub struct Marshaller {
    date_as_integer: bool,
    geo_point: GeoPointConfig,
}

impl Marshaller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_as_integer(mut self, date_as_integer: bool) -> Self {
        self.date_as_integer = date_as_integer;
        self
    }

    pub fn with_geo_point(mut self, geo_point: GeoPointConfig) -> Self {
        self.geo_point = geo_point;
        self
    }

    pub fn date_as_integer(&self) -> bool {
        self.date_as_integer
    }

    pub fn geo_point(&self) -> &GeoPointConfig {
        &self.geo_point
    }

    /// Convert a document into its stored representation.
    ///
    /// Keys not declared in `fields` are dropped.
    pub fn marshall(&self, fields: &[Field], document: &Document) -> Result<Document, SearchError> {
        let mut raw = Document::new();

        for field in fields {
            let Some(value) = document.get(&field.name) else {
                continue;
            };

            match &field.field_type {
                FieldType::Object { fields: children } => {
                    let value = map_values(field, value, |element| {
                        Ok(Value::Object(self.marshall(
                            children,
                            Self::as_object(field, element)?,
                        )?))
                    })?;
                    raw.insert(field.name.clone(), value);
                }
                FieldType::Typed { type_field, .. } => {
                    raw.insert(
                        field.name.clone(),
                        self.marshall_typed(field, type_field, value)?,
                    );
                }
                FieldType::DateTime if self.date_as_integer => {
                    let stored = map_values(field, value, |v| match v {
                        Value::String(date) => {
                            Ok(Value::from(date_to_timestamp(&field.name, date)?))
                        }
                        other => Ok(other.clone()),
                    })?;
                    raw.insert(field.name.clone(), stored);
                    raw.insert(original_date_key(&field.name), value.clone());
                }
                FieldType::GeoPoint => {
                    let key = self
                        .geo_point
                        .name
                        .clone()
                        .unwrap_or_else(|| field.name.clone());
                    let value = map_values(field, value, |v| self.marshall_geo(field, v))?;
                    raw.insert(key, value);
                }
                _ => {
                    raw.insert(field.name.clone(), value.clone());
                }
            }
        }

        Ok(raw)
    }

    /// Convert a stored representation back into a document.
    pub fn unmarshall(&self, fields: &[Field], raw: &Document) -> Result<Document, SearchError> {
        let mut document = Document::new();

        for field in fields {
            let key = match (&field.field_type, &self.geo_point.name) {
                (FieldType::GeoPoint, Some(name)) => name.as_str(),
                _ => field.name.as_str(),
            };
            let Some(value) = raw.get(key) else {
                continue;
            };

            let value = match &field.field_type {
                FieldType::Object { fields: children } => map_values(field, value, |element| {
                    Ok(Value::Object(self.unmarshall(
                        children,
                        Self::as_object(field, element)?,
                    )?))
                })?,
                FieldType::Typed { type_field, .. } => {
                    self.unmarshall_typed(field, type_field, value)?
                }
                FieldType::DateTime if self.date_as_integer => {
                    match raw.get(&original_date_key(&field.name)) {
                        Some(original) => original.clone(),
                        None => map_values(field, value, |v| match v.as_i64() {
                            Some(timestamp) => {
                                Ok(Value::String(timestamp_to_date(&field.name, timestamp)?))
                            }
                            None => Ok(v.clone()),
                        })?,
                    }
                }
                FieldType::GeoPoint => map_values(field, value, |v| self.unmarshall_geo(field, v))?,
                _ => value.clone(),
            };

            document.insert(field.name.clone(), value);
        }

        Ok(document)
    }

    fn marshall_typed(
        &self,
        field: &Field,
        type_field: &str,
        value: &Value,
    ) -> Result<Value, SearchError> {
        let elements: Vec<&Value> = match value {
            Value::Null => return Ok(Value::Null),
            Value::Array(items) if field.multiple => items.iter().collect(),
            other if !field.multiple => vec![other],
            _ => {
                return Err(SearchError::marshalling(format!(
                    "Field \"{}\" expects a sequence",
                    field.name
                )))
            }
        };

        let mut grouped = Map::new();
        for (position, element) in elements.into_iter().enumerate() {
            let element = Self::as_object(field, element)?;
            let type_name = Self::type_name(field, type_field, element)?;
            let variant = field.variant(type_name).ok_or_else(|| Self::unknown_type(field, type_name))?;

            let mut marshalled = self.marshall(&variant.fields, element)?;

            if !field.multiple {
                grouped.insert(type_name.to_string(), Value::Object(marshalled));
                continue;
            }

            marshalled.insert(ORIGINAL_INDEX_KEY.to_string(), Value::from(position));
            let slot = grouped
                .entry(type_name.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(group) = slot {
                group.push(Value::Object(marshalled));
            }
        }

        Ok(Value::Object(grouped))
    }

    fn unmarshall_typed(
        &self,
        field: &Field,
        type_field: &str,
        value: &Value,
    ) -> Result<Value, SearchError> {
        let grouped = match value {
            Value::Null => return Ok(Value::Null),
            Value::Object(grouped) => grouped,
            _ => {
                return Err(SearchError::marshalling(format!(
                    "Field \"{}\" expects its values grouped by type",
                    field.name
                )))
            }
        };

        let mut elements: Vec<(u64, Document)> = Vec::new();
        for (type_name, group) in grouped {
            let variant = field
                .variant(type_name)
                .ok_or_else(|| Self::unknown_type(field, type_name))?;

            let members: Vec<&Value> = match group {
                Value::Array(items) if field.multiple => items.iter().collect(),
                other => vec![other],
            };

            for member in members {
                let member = Self::as_object(field, member)?;
                let position = member
                    .get(ORIGINAL_INDEX_KEY)
                    .and_then(Value::as_u64)
                    .unwrap_or(u64::MAX);

                let mut document = Document::new();
                document.insert(type_field.to_string(), Value::String(type_name.clone()));
                document.extend(self.unmarshall(&variant.fields, member)?);
                elements.push((position, document));
            }
        }

        if !field.multiple {
            return Ok(elements
                .pop()
                .map(|(_, document)| Value::Object(document))
                .unwrap_or(Value::Null));
        }

        elements.sort_by_key(|(position, _)| *position);
        Ok(Value::Array(
            elements
                .into_iter()
                .map(|(_, document)| Value::Object(document))
                .collect(),
        ))
    }

    fn marshall_geo(&self, field: &Field, value: &Value) -> Result<Value, SearchError> {
        let coordinate = |name: &str| {
            value.get(name).cloned().ok_or_else(|| {
                SearchError::marshalling(format!(
                    "Geo point field \"{}\" is missing its {}",
                    field.name, name
                ))
            })
        };
        let latitude = coordinate("latitude")?;
        let longitude = coordinate("longitude")?;

        match (&self.geo_point.latitude, &self.geo_point.longitude) {
            (GeoKey::Key(lat), GeoKey::Key(lng)) => {
                let mut point = Map::new();
                point.insert(lat.clone(), latitude);
                point.insert(lng.clone(), longitude);
                Ok(Value::Object(point))
            }
            (GeoKey::Position(lat), GeoKey::Position(lng)) => {
                let mut point = vec![Value::Null; (*lat).max(*lng) + 1];
                point[*lat] = latitude;
                point[*lng] = longitude;
                Ok(Value::Array(point))
            }
            _ => Err(SearchError::config(
                "Geo point latitude and longitude must both be keys or both be positions",
            )),
        }
    }

    fn unmarshall_geo(&self, field: &Field, value: &Value) -> Result<Value, SearchError> {
        let coordinate = |key: &GeoKey| {
            let found = match key {
                GeoKey::Key(name) => value.get(name.as_str()),
                GeoKey::Position(position) => value.get(*position),
            };
            found.cloned().ok_or_else(|| {
                SearchError::marshalling(format!(
                    "Stored geo point \"{}\" is missing a coordinate",
                    field.name
                ))
            })
        };

        let mut point = Map::new();
        point.insert("latitude".to_string(), coordinate(&self.geo_point.latitude)?);
        point.insert("longitude".to_string(), coordinate(&self.geo_point.longitude)?);
        Ok(Value::Object(point))
    }

    fn as_object<'a>(field: &Field, value: &'a Value) -> Result<&'a Document, SearchError> {
        value.as_object().ok_or_else(|| {
            SearchError::marshalling(format!("Field \"{}\" expects an object", field.name))
        })
    }

    fn type_name<'a>(
        field: &Field,
        type_field: &str,
        element: &'a Document,
    ) -> Result<&'a str, SearchError> {
        element
            .get(type_field)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SearchError::marshalling(format!(
                    "Field \"{}\" has an element without a \"{}\" value",
                    field.name, type_field
                ))
            })
    }

    fn unknown_type(field: &Field, type_name: &str) -> SearchError {
        let known = match &field.field_type {
            FieldType::Typed { types, .. } => types.iter().map(|t| t.name.clone()).collect(),
            _ => Vec::new(),
        };
        SearchError::unknown_type(type_name, known)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn fields() -> Vec<Field> {
        vec![
            Field::identifier("uuid"),
            Field::text("title"),
            Field::typed(
                "header",
                "type",
                vec![
                    ("image", vec![Field::integer("media")]),
                    ("video", vec![Field::text("media")]),
                ],
            ),
            Field::typed(
                "blocks",
                "type",
                vec![
                    ("text", vec![Field::text("title"), Field::text("description")]),
                    ("embed", vec![Field::text("title"), Field::text("media")]),
                ],
            )
            .multiple(true),
            Field::object("footer", vec![Field::text("title")]),
            Field::date_time("created"),
            Field::geo_point("location"),
        ]
    }

    fn document() -> Document {
        doc(json!({
            "uuid": "23b30f01-d8fd-4dca-b36a-4710e360a965",
            "title": "New Blog",
            "header": { "type": "image", "media": 1 },
            "blocks": [
                { "type": "text", "title": "Title", "description": "<p>Description</p>" },
                { "type": "embed", "title": "Video", "media": "https://www.youtube.com/watch?v=iYM2zFP3Zn0" },
                { "type": "text", "title": "Title 2", "description": null },
            ],
            "footer": { "title": "New Footer" },
            "created": "2022-01-24T11:00:00+00:00",
            "location": { "latitude": 40.7128, "longitude": -74.006 },
        }))
    }

    #[test]
    fn test_typed_fields_are_grouped() {
        let raw = Marshaller::new().marshall(&fields(), &document()).unwrap();

        assert_eq!(raw["header"], json!({ "image": { "media": 1 } }));
        assert_eq!(
            raw["blocks"],
            json!({
                "text": [
                    { "title": "Title", "description": "<p>Description</p>", "_originalIndex": 0 },
                    { "title": "Title 2", "description": null, "_originalIndex": 2 },
                ],
                "embed": [
                    { "title": "Video", "media": "https://www.youtube.com/watch?v=iYM2zFP3Zn0", "_originalIndex": 1 },
                ],
            })
        );
    }

    #[test]
    fn test_round_trip() {
        let configs = vec![
            Marshaller::new(),
            Marshaller::new().with_geo_point(GeoPointConfig::keys("lat", "lon")),
            Marshaller::new()
                .with_date_as_integer(true)
                .with_geo_point(GeoPointConfig::keys("lat", "lng").renamed("_geoloc")),
            Marshaller::new()
                .with_date_as_integer(true)
                .with_geo_point(GeoPointConfig::positional()),
        ];

        for marshaller in configs {
            let raw = marshaller.marshall(&fields(), &document()).unwrap();
            assert_eq!(marshaller.unmarshall(&fields(), &raw).unwrap(), document());
        }
    }

    #[test]
    fn test_dates_keep_their_original_text() {
        let fields = vec![
            Field::identifier("id"),
            Field::date_time("published"),
            Field::date_time("updates").multiple(true),
            Field::object("footer", vec![Field::date_time("signed")]),
        ];
        let marshaller = Marshaller::new().with_date_as_integer(true);

        for published in ["2022-01-24T12:00:00+01:00", "2022-01-24", "2022-01-24T11:00:00Z"] {
            let document = doc(json!({
                "id": "1",
                "published": published,
                "updates": ["2022-01-25", null, "2022-01-26T08:30:00-05:00"],
                "footer": { "signed": "2022-02-01" },
            }));

            let raw = marshaller.marshall(&fields, &document).unwrap();
            assert!(raw["published"].is_i64());
            assert_eq!(raw[&original_date_key("published")], json!(published));
            assert_eq!(raw["footer"]["signed"], json!(1643673600));
            assert_eq!(marshaller.unmarshall(&fields, &raw).unwrap(), document);
        }
    }

    #[test]
    fn test_dates_without_original_text_are_rendered_in_utc() {
        let fields = vec![Field::identifier("id"), Field::date_time("published")];
        let raw = doc(json!({ "id": "1", "published": 1643022000 }));

        let document = Marshaller::new()
            .with_date_as_integer(true)
            .unmarshall(&fields, &raw)
            .unwrap();
        assert_eq!(document["published"], json!("2022-01-24T11:00:00+00:00"));
    }

    #[test]
    fn test_geo_point_conventions() {
        let algolia = Marshaller::new()
            .with_geo_point(GeoPointConfig::keys("lat", "lng").renamed("_geoloc"));
        let raw = algolia.marshall(&fields(), &document()).unwrap();
        assert!(raw.get("location").is_none());
        assert_eq!(raw["_geoloc"], json!({ "lat": 40.7128, "lng": -74.006 }));

        let positional = Marshaller::new().with_geo_point(GeoPointConfig::positional());
        let raw = positional.marshall(&fields(), &document()).unwrap();
        assert_eq!(raw["location"], json!([40.7128, -74.006]));
    }

    #[test]
    fn test_date_as_integer() {
        let marshaller = Marshaller::new().with_date_as_integer(true);
        let raw = marshaller.marshall(&fields(), &document()).unwrap();
        assert_eq!(raw["created"], json!(1643022000));
    }

    #[test]
    fn test_undeclared_keys_are_dropped() {
        let mut document = document();
        document.insert("internal".to_string(), json!(true));

        let raw = Marshaller::new().marshall(&fields(), &document).unwrap();
        assert!(raw.get("internal").is_none());
    }

    #[test]
    fn test_unknown_type() {
        let document = doc(json!({
            "uuid": "1",
            "blocks": [{ "type": "gallery", "title": "A" }],
        }));

        assert!(matches!(
            Marshaller::new().marshall(&fields(), &document),
            Err(SearchError::UnknownType { type_name, .. }) if type_name == "gallery"
        ));
    }
}
