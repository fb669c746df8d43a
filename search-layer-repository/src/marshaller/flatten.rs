//! Flattening marshaller.
//!
//! Object and typed fields are rewritten into depth-1 keys joined by a
//! separator (`footer.title`, `blocks.text.title`). Once any ancestor is
//! multiple, every value produced below it becomes a sequence and sibling
//! elements contribute to the same key in source order. The original
//! document is kept as JSON under [`SOURCE_KEY`] and is the only thing
//! `unmarshall` reads back.

use std::collections::HashMap;

use search_layer_shared::{Document, Field, FieldKind, FieldType};
use serde_json::Value;

use crate::errors::SearchError;
use crate::marshaller::{date_to_timestamp, map_values};

/// Key holding the JSON encoded original document in a flattened record.
pub const SOURCE_KEY: &str = "_source";

const RAW_SUFFIX: &str = "raw";

/// A flattened level plus the keys that must be JSON encoded once the
/// whole document is flattened.
#[derive(Debug, Default)]
struct Flattened {
    record: Document,
    json_keys: Vec<String>,
}

/// Converts documents into flat records and back.
///
/// # Example
///
/// ```
/// use search_layer_repository::marshaller::FlattenMarshaller;
/// use search_layer_shared::Field;
/// use serde_json::json;
///
/// let fields = vec![
///     Field::identifier("id"),
///     Field::object("comments", vec![Field::text("text")]).multiple(true),
/// ];
/// let document = json!({
///     "id": "1",
///     "comments": [{ "text": "First" }, { "text": "Second" }],
/// });
///
/// let marshaller = FlattenMarshaller::new();
/// let record = marshaller
///     .marshall(&fields, document.as_object().unwrap())
///     .unwrap();
///
/// assert_eq!(record["comments.text"], json!(["First", "Second"]));
/// assert_eq!(
///     marshaller.unmarshall(&fields, &record).unwrap(),
///     *document.as_object().unwrap()
/// );
/// ```
#[derive(Debug, Clone)]
pub struct FlattenMarshaller {
    date_as_integer: bool,
    add_raw_filter_text_field: bool,
    separator: String,
    json_kinds: Vec<FieldKind>,
}

impl Default for FlattenMarshaller {
    fn default() -> Self {
        Self {
            date_as_integer: false,
            add_raw_filter_text_field: false,
            separator: ".".to_string(),
            json_kinds: Vec::new(),
        }
    }
}

impl FlattenMarshaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store date time fields as Unix seconds.
    pub fn with_date_as_integer(mut self, date_as_integer: bool) -> Self {
        self.date_as_integer = date_as_integer;
        self
    }

    /// Duplicate searchable text fields that are also filterable or sortable
    /// under `<name><separator>raw`.
    pub fn with_raw_filter_text_field(mut self, add_raw_filter_text_field: bool) -> Self {
        self.add_raw_filter_text_field = add_raw_filter_text_field;
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// JSON encode sequence values of these field kinds.
    pub fn with_json_kinds(mut self, json_kinds: Vec<FieldKind>) -> Self {
        self.json_kinds = json_kinds;
        self
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn date_as_integer(&self) -> bool {
        self.date_as_integer
    }

    /// Flatten a document.
    ///
    /// # Arguments
    ///
    /// * `fields` - The index's root fields
    /// * `document` - The document to flatten
    ///
    /// # Returns
    ///
    /// * `Ok(Document)` - The flat record, ending with [`SOURCE_KEY`]
    /// * `Err(SearchError)` - If a typed element names an unknown type or a
    ///   value does not fit its field
    pub fn marshall(&self, fields: &[Field], document: &Document) -> Result<Document, SearchError> {
        let Flattened {
            mut record,
            json_keys,
        } = self.flatten(fields, document, false)?;

        let mut encoded: Vec<&str> = Vec::with_capacity(json_keys.len());
        for key in &json_keys {
            if encoded.contains(&key.as_str()) {
                continue;
            }
            encoded.push(key);

            if let Some(value) = record.get_mut(key) {
                if !value.is_null() {
                    *value = Value::String(serde_json::to_string(value)?);
                }
            }
        }

        record.insert(
            SOURCE_KEY.to_string(),
            Value::String(serde_json::to_string(document)?),
        );

        Ok(record)
    }

    /// Restore the original document from a flat record.
    pub fn unmarshall(&self, _fields: &[Field], record: &Document) -> Result<Document, SearchError> {
        let source = record
            .get(SOURCE_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SearchError::marshalling(format!("Record has no \"{}\" payload", SOURCE_KEY))
            })?;

        serde_json::from_str(source).map_err(|e| {
            SearchError::marshalling(format!("Invalid \"{}\" payload: {}", SOURCE_KEY, e))
        })
    }

    fn flatten(
        &self,
        fields: &[Field],
        raw: &Document,
        parent_multiple: bool,
    ) -> Result<Flattened, SearchError> {
        let mut spliced: HashMap<&str, Document> = HashMap::new();
        let mut replaced: HashMap<&str, Value> = HashMap::new();
        let mut raw_copies: Vec<(String, Value)> = Vec::new();
        let mut json_keys = Vec::new();

        for field in fields {
            let Some(value) = raw.get(&field.name) else {
                continue;
            };

            match &field.field_type {
                FieldType::Object { fields: children } => {
                    let parts = Self::elements(field, value)?
                        .into_iter()
                        .map(|element| {
                            self.flatten(children, element, parent_multiple || field.multiple)
                                .map(|flattened| (field.name.clone(), flattened))
                        })
                        .collect::<Result<Vec<_>, _>>()?;

                    let merged = self.merge(parts, parent_multiple || field.multiple);
                    json_keys.extend(merged.json_keys);
                    spliced.insert(field.name.as_str(), merged.record);
                }
                FieldType::Typed { type_field, types } => {
                    let mut parts = Vec::new();
                    for element in Self::elements(field, value)? {
                        let type_name = element
                            .get(type_field)
                            .and_then(Value::as_str)
                            .ok_or_else(|| {
                                SearchError::marshalling(format!(
                                    "Field \"{}\" has an element without a \"{}\" value",
                                    field.name, type_field
                                ))
                            })?;
                        let variant = field.variant(type_name).ok_or_else(|| {
                            SearchError::unknown_type(
                                type_name,
                                types.iter().map(|t| t.name.clone()).collect(),
                            )
                        })?;

                        let mut object = element.clone();
                        object.remove(type_field);

                        let flattened = self.flatten(
                            &variant.fields,
                            &object,
                            parent_multiple || field.multiple,
                        )?;
                        parts.push((
                            format!("{}{}{}", field.name, self.separator, type_name),
                            flattened,
                        ));
                    }

                    let merged = self.merge(parts, parent_multiple || field.multiple);
                    json_keys.extend(merged.json_keys);
                    spliced.insert(field.name.as_str(), merged.record);
                }
                FieldType::DateTime if self.date_as_integer => {
                    let converted = map_values(field, value, |v| match v {
                        Value::String(date) => Ok(Value::from(date_to_timestamp(&field.name, date)?)),
                        other => Ok(other.clone()),
                    })?;
                    replaced.insert(field.name.as_str(), converted);
                }
                _ => {}
            }

            if self.add_raw_filter_text_field
                && field.kind() == FieldKind::Text
                && field.searchable
                && (field.sortable || field.filterable)
            {
                raw_copies.push((
                    format!("{}{}{}", field.name, self.separator, RAW_SUFFIX),
                    value.clone(),
                ));
            }

            if (field.multiple || parent_multiple) && self.json_kinds.contains(&field.kind()) {
                json_keys.push(field.name.clone());
            }
        }

        // Rebuild in source order, substituting compound fields in place.
        let mut record = Document::new();
        for (key, value) in raw {
            if let Some(entries) = spliced.remove(key.as_str()) {
                record.extend(entries);
                continue;
            }

            let value = replaced
                .remove(key.as_str())
                .unwrap_or_else(|| value.clone());
            record.insert(key.clone(), value);
        }
        record.extend(raw_copies);

        Ok(Flattened { record, json_keys })
    }

    /// Prefix each part's keys and merge them into one level.
    ///
    /// Under a multiple ancestor every key collects a sequence: scalar
    /// values are pushed and sequences are spliced.
    fn merge(&self, parts: Vec<(String, Flattened)>, multiple: bool) -> Flattened {
        let mut merged = Flattened::default();

        for (prefix, flattened) in parts {
            merged.json_keys.extend(
                flattened
                    .json_keys
                    .into_iter()
                    .map(|key| format!("{}{}{}", prefix, self.separator, key)),
            );

            for (key, value) in flattened.record {
                let key = format!("{}{}{}", prefix, self.separator, key);

                if !multiple {
                    merged.record.insert(key, value);
                    continue;
                }

                let slot = merged
                    .record
                    .entry(key)
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(sequence) = slot {
                    match value {
                        Value::Array(values) => sequence.extend(values),
                        other => sequence.push(other),
                    }
                }
            }
        }

        merged
    }

    /// The objects held by a compound field value.
    fn elements<'a>(field: &Field, value: &'a Value) -> Result<Vec<&'a Document>, SearchError> {
        let invalid = || {
            SearchError::marshalling(format!(
                "Field \"{}\" expects {}",
                field.name,
                if field.multiple {
                    "a sequence of objects"
                } else {
                    "an object"
                }
            ))
        };

        match value {
            Value::Null => Ok(Vec::new()),
            Value::Object(object) if !field.multiple => Ok(vec![object]),
            Value::Array(items) if field.multiple => items
                .iter()
                .map(|item| item.as_object().ok_or_else(invalid))
                .collect(),
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    /// Marshall with raw text fields and compare against the expected
    /// flattened columns followed by `_source`.
    fn assert_flattens(fields: &[Field], document: Value, expected: Value) {
        let marshaller = FlattenMarshaller::new().with_raw_filter_text_field(true);
        let document = doc(document);

        let record = marshaller.marshall(fields, &document).unwrap();

        let mut expected = doc(expected);
        expected.insert(
            SOURCE_KEY.to_string(),
            Value::String(serde_json::to_string(&document).unwrap()),
        );

        let record_keys: Vec<&String> = record.keys().collect();
        let expected_keys: Vec<&String> = expected.keys().collect();
        assert_eq!(record_keys, expected_keys);
        assert_eq!(record, expected);

        assert_eq!(marshaller.unmarshall(fields, &record).unwrap(), document);
    }

    fn block_fields() -> Vec<Field> {
        vec![
            Field::text("title"),
            Field::text("description"),
            Field::integer("media").multiple(true).searchable(false),
        ]
    }

    #[test]
    fn test_complex_object() {
        let fields = vec![
            Field::identifier("uuid"),
            Field::text("title"),
            Field::typed(
                "header",
                "type",
                vec![
                    ("image", vec![Field::integer("media")]),
                    ("video", vec![Field::text("media").searchable(false)]),
                ],
            ),
            Field::text("article"),
            Field::typed(
                "blocks",
                "type",
                vec![
                    ("text", block_fields()),
                    (
                        "embed",
                        vec![Field::text("title"), Field::text("media").searchable(false)],
                    ),
                ],
            )
            .multiple(true),
            Field::object("footer", vec![Field::text("title")]),
            Field::date_time("created").filterable(true).sortable(true),
            Field::integer("commentsCount").filterable(true).sortable(true),
            Field::float("rating").filterable(true).sortable(true),
            Field::boolean("isSpecial").filterable(true),
            Field::object(
                "comments",
                vec![Field::text("email").searchable(false), Field::text("text")],
            )
            .multiple(true),
            Field::text("tags").multiple(true).filterable(true),
            Field::integer("categoryIds").multiple(true).filterable(true),
            Field::geo_point("location").filterable(true).sortable(true),
        ];

        assert_flattens(
            &fields,
            json!({
                "uuid": "23b30f01-d8fd-4dca-b36a-4710e360a965",
                "title": "New Blog",
                "header": { "type": "image", "media": 1 },
                "article": "<article><h2>New Subtitle</h2><p>A html field with some content</p></article>",
                "blocks": [
                    { "type": "text", "title": "Title", "description": "<p>Description</p>", "media": [3, 4] },
                    { "type": "text", "title": "Title 2", "description": null },
                    { "type": "embed", "title": "Video", "media": "https://www.youtube.com/watch?v=iYM2zFP3Zn0" },
                    { "type": "text", "title": "Title 4", "description": "<p>Description 4</p>", "media": [3, 4] },
                ],
                "footer": { "title": "New Footer" },
                "created": "2022-01-24T12:00:00+01:00",
                "commentsCount": 2,
                "rating": 3.5,
                "isSpecial": true,
                "comments": [
                    { "email": "admin.nonesearchablefield@localhost", "text": "Awesome blog!" },
                    { "email": "example.nonesearchablefield@localhost", "text": "Like this blog!" },
                ],
                "tags": ["Tech", "UI"],
                "categoryIds": [1, 2],
                "location": { "latitude": 40.7128, "longitude": -74.006 },
            }),
            json!({
                "uuid": "23b30f01-d8fd-4dca-b36a-4710e360a965",
                "title": "New Blog",
                "header.image.media": 1,
                "article": "<article><h2>New Subtitle</h2><p>A html field with some content</p></article>",
                "blocks.text.title": ["Title", "Title 2", "Title 4"],
                "blocks.text.description": ["<p>Description</p>", null, "<p>Description 4</p>"],
                "blocks.text.media": [3, 4, 3, 4],
                "blocks.embed.title": ["Video"],
                "blocks.embed.media": ["https://www.youtube.com/watch?v=iYM2zFP3Zn0"],
                "footer.title": "New Footer",
                "created": "2022-01-24T12:00:00+01:00",
                "commentsCount": 2,
                "rating": 3.5,
                "isSpecial": true,
                "comments.email": ["admin.nonesearchablefield@localhost", "example.nonesearchablefield@localhost"],
                "comments.text": ["Awesome blog!", "Like this blog!"],
                "tags": ["Tech", "UI"],
                "categoryIds": [1, 2],
                "location": { "latitude": 40.7128, "longitude": -74.006 },
                "tags.raw": ["Tech", "UI"],
            }),
        );
    }

    #[test]
    fn test_nested_object() {
        let fields = vec![
            Field::identifier("uuid"),
            Field::object(
                "object",
                vec![
                    Field::text("title"),
                    Field::object(
                        "secondaryObject",
                        vec![
                            Field::text("title"),
                            Field::object(
                                "tertiaryObject",
                                vec![
                                    Field::text("title"),
                                    Field::integer("media").multiple(true),
                                    Field::object(
                                        "quaternaryObject",
                                        vec![
                                            Field::text("title"),
                                            Field::integer("media").multiple(true),
                                        ],
                                    ),
                                ],
                            ),
                        ],
                    ),
                ],
            ),
        ];

        assert_flattens(
            &fields,
            json!({
                "uuid": "23b30f01-d8fd-4dca-b36a-4710e360a965",
                "object": {
                    "title": "Title",
                    "secondaryObject": {
                        "title": "Secondary Title",
                        "tertiaryObject": {
                            "title": "Tertiary Title",
                            "media": [1, 2],
                            "quaternaryObject": { "title": "Quaternary Title", "media": [3, 4] },
                        },
                    },
                },
            }),
            json!({
                "uuid": "23b30f01-d8fd-4dca-b36a-4710e360a965",
                "object.title": "Title",
                "object.secondaryObject.title": "Secondary Title",
                "object.secondaryObject.tertiaryObject.title": "Tertiary Title",
                "object.secondaryObject.tertiaryObject.media": [1, 2],
                "object.secondaryObject.tertiaryObject.quaternaryObject.title": "Quaternary Title",
                "object.secondaryObject.tertiaryObject.quaternaryObject.media": [3, 4],
            }),
        );
    }

    #[test]
    fn test_nested_object_multiple() {
        let fields = vec![
            Field::identifier("uuid"),
            Field::object(
                "object",
                vec![
                    Field::text("title"),
                    Field::object(
                        "secondaryObject",
                        vec![
                            Field::text("title"),
                            Field::object(
                                "tertiaryObject",
                                vec![
                                    Field::text("title"),
                                    Field::integer("media").multiple(true),
                                    Field::object(
                                        "quaternaryObject",
                                        vec![
                                            Field::text("title"),
                                            Field::integer("media").multiple(true),
                                        ],
                                    ),
                                ],
                            ),
                        ],
                    )
                    .multiple(true),
                ],
            ),
        ];

        assert_flattens(
            &fields,
            json!({
                "uuid": "23b30f01-d8fd-4dca-b36a-4710e360a965",
                "object": {
                    "title": "Title",
                    "secondaryObject": [
                        {
                            "title": "Secondary Title",
                            "tertiaryObject": {
                                "title": "Tertiary Title",
                                "media": [1, 2],
                                "quaternaryObject": { "title": "Quaternary Title", "media": [3, 4] },
                            },
                        },
                        {
                            "title": null,
                            "tertiaryObject": {
                                "title": null,
                                "quaternaryObject": { "title": null },
                            },
                        },
                        {
                            "title": "Secondary Title 3",
                            "tertiaryObject": {
                                "title": "Tertiary Title 3",
                                "media": [6, 7],
                                "quaternaryObject": { "title": "Quaternary Title 3", "media": [8, 9] },
                            },
                        },
                    ],
                },
            }),
            json!({
                "uuid": "23b30f01-d8fd-4dca-b36a-4710e360a965",
                "object.title": "Title",
                "object.secondaryObject.title": ["Secondary Title", null, "Secondary Title 3"],
                "object.secondaryObject.tertiaryObject.title": ["Tertiary Title", null, "Tertiary Title 3"],
                "object.secondaryObject.tertiaryObject.media": [1, 2, 6, 7],
                "object.secondaryObject.tertiaryObject.quaternaryObject.title": ["Quaternary Title", null, "Quaternary Title 3"],
                "object.secondaryObject.tertiaryObject.quaternaryObject.media": [3, 4, 8, 9],
            }),
        );
    }

    #[test]
    fn test_nested_types_multiple() {
        let mut text_fields = block_fields();
        text_fields.push(
            Field::typed(
                "secondaryBlocks",
                "type",
                vec![
                    ("text", block_fields()),
                    (
                        "embed",
                        vec![Field::text("title"), Field::text("media").searchable(false)],
                    ),
                ],
            )
            .multiple(true),
        );

        let fields = vec![
            Field::identifier("uuid"),
            Field::typed(
                "blocks",
                "type",
                vec![
                    ("text", text_fields),
                    (
                        "embed",
                        vec![Field::text("title"), Field::text("media").searchable(false)],
                    ),
                ],
            )
            .multiple(true),
        ];

        let secondary = json!([
            { "type": "text", "title": "Title", "description": "<p>Description</p>", "media": [3, 4] },
            { "type": "text", "title": "Title 2", "description": null },
            { "type": "embed", "title": "Video", "media": "https://www.youtube.com/watch?v=iYM2zFP3Zn0" },
            { "type": "text", "title": "Title 4", "description": "<p>Description 4</p>", "media": [3, 4] },
        ]);

        assert_flattens(
            &fields,
            json!({
                "uuid": "23b30f01-d8fd-4dca-b36a-4710e360a965",
                "blocks": [
                    {
                        "type": "text",
                        "title": "Title",
                        "description": "<p>Description</p>",
                        "media": [3, 4],
                        "secondaryBlocks": secondary.clone(),
                    },
                    { "type": "text", "title": "Title 2", "description": null },
                    { "type": "embed", "title": "Video", "media": "https://www.youtube.com/watch?v=iYM2zFP3Zn0" },
                    {
                        "type": "text",
                        "title": "Title 4",
                        "description": "<p>Description 4</p>",
                        "media": [3, 4],
                        "secondaryBlocks": secondary,
                    },
                ],
            }),
            json!({
                "uuid": "23b30f01-d8fd-4dca-b36a-4710e360a965",
                "blocks.text.title": ["Title", "Title 2", "Title 4"],
                "blocks.text.description": ["<p>Description</p>", null, "<p>Description 4</p>"],
                "blocks.text.media": [3, 4, 3, 4],
                "blocks.text.secondaryBlocks.text.title": ["Title", "Title 2", "Title 4", "Title", "Title 2", "Title 4"],
                "blocks.text.secondaryBlocks.text.description": ["<p>Description</p>", null, "<p>Description 4</p>", "<p>Description</p>", null, "<p>Description 4</p>"],
                "blocks.text.secondaryBlocks.text.media": [3, 4, 3, 4, 3, 4, 3, 4],
                "blocks.text.secondaryBlocks.embed.title": ["Video", "Video"],
                "blocks.text.secondaryBlocks.embed.media": ["https://www.youtube.com/watch?v=iYM2zFP3Zn0", "https://www.youtube.com/watch?v=iYM2zFP3Zn0"],
                "blocks.embed.title": ["Video"],
                "blocks.embed.media": ["https://www.youtube.com/watch?v=iYM2zFP3Zn0"],
            }),
        );
    }

    #[test]
    fn test_nested_objects_multiple() {
        let mut block = block_fields();
        block.push(Field::object("secondaryBlocks", block_fields()).multiple(true));

        let fields = vec![
            Field::identifier("uuid"),
            Field::object("blocks", block).multiple(true),
        ];

        let secondary = json!([
            { "title": "Title", "description": "<p>Description</p>", "media": [3, 4] },
            { "title": "Title 2", "description": null },
            { "title": "Title 4", "description": "<p>Description 4</p>", "media": [3, 4] },
        ]);

        assert_flattens(
            &fields,
            json!({
                "uuid": "23b30f01-d8fd-4dca-b36a-4710e360a965",
                "blocks": [
                    {
                        "title": "Title",
                        "description": "<p>Description</p>",
                        "media": [3, 4],
                        "secondaryBlocks": secondary.clone(),
                    },
                    { "title": "Title 2", "description": null },
                    {
                        "title": "Title 4",
                        "description": "<p>Description 4</p>",
                        "media": [3, 4],
                        "secondaryBlocks": secondary,
                    },
                ],
            }),
            json!({
                "uuid": "23b30f01-d8fd-4dca-b36a-4710e360a965",
                "blocks.title": ["Title", "Title 2", "Title 4"],
                "blocks.description": ["<p>Description</p>", null, "<p>Description 4</p>"],
                "blocks.media": [3, 4, 3, 4],
                "blocks.secondaryBlocks.title": ["Title", "Title 2", "Title 4", "Title", "Title 2", "Title 4"],
                "blocks.secondaryBlocks.description": ["<p>Description</p>", null, "<p>Description 4</p>", "<p>Description</p>", null, "<p>Description 4</p>"],
                "blocks.secondaryBlocks.media": [3, 4, 3, 4, 3, 4, 3, 4],
            }),
        );
    }

    #[test]
    fn test_key_present_in_some_elements() {
        let fields = vec![
            Field::identifier("id"),
            Field::object("items", vec![Field::integer("x"), Field::integer("y")]).multiple(true),
        ];
        let document = doc(json!({
            "id": "1",
            "items": [{ "x": 1, "y": 1 }, { "y": 2 }, { "x": 3, "y": 3 }, { "y": 4 }],
        }));

        let record = FlattenMarshaller::new().marshall(&fields, &document).unwrap();

        assert_eq!(record["items.x"], json!([1, 3]));
        assert_eq!(record["items.y"], json!([1, 2, 3, 4]));
    }

    #[test]
    fn test_missing_field_is_skipped() {
        let fields = vec![
            Field::identifier("id"),
            Field::object("footer", vec![Field::text("title")]),
            Field::text("title").filterable(true),
        ];
        let document = doc(json!({ "id": "1" }));

        let record = FlattenMarshaller::new()
            .with_raw_filter_text_field(true)
            .marshall(&fields, &document)
            .unwrap();

        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", SOURCE_KEY]);
    }

    #[test]
    fn test_unknown_type() {
        let fields = vec![
            Field::identifier("id"),
            Field::typed(
                "blocks",
                "type",
                vec![("text", vec![Field::text("title")]), ("embed", vec![Field::text("media")])],
            )
            .multiple(true),
        ];
        let document = doc(json!({
            "id": "1",
            "blocks": [{ "type": "text", "title": "A" }, { "type": "gallery", "title": "B" }],
        }));

        let err = FlattenMarshaller::new().marshall(&fields, &document).unwrap_err();

        match &err {
            SearchError::UnknownType { type_name, known } => {
                assert_eq!(type_name, "gallery");
                assert_eq!(known, &vec!["text".to_string(), "embed".to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(
            err.to_string(),
            "Type \"gallery\" not found. Existing types are \"text\", \"embed\""
        );
    }

    #[test]
    fn test_date_as_integer() {
        let fields = vec![
            Field::identifier("id"),
            Field::date_time("created"),
            Field::object("events", vec![Field::date_time("at")]).multiple(true),
        ];
        let document = doc(json!({
            "id": "1",
            "created": "2022-01-24T12:00:00+01:00",
            "events": [{ "at": "2022-01-24" }, { "at": null }],
        }));

        let record = FlattenMarshaller::new()
            .with_date_as_integer(true)
            .marshall(&fields, &document)
            .unwrap();

        assert_eq!(record["created"], json!(1643022000));
        assert_eq!(record["events.at"], json!([1642982400, null]));
    }

    #[test]
    fn test_json_kinds() {
        let fields = vec![
            Field::identifier("id"),
            Field::text("tags").multiple(true),
            Field::text("title"),
            Field::object("comments", vec![Field::text("text")]).multiple(true),
        ];
        let document = doc(json!({
            "id": "1",
            "tags": ["a", "b"],
            "title": "Title",
            "comments": [{ "text": "x" }, { "text": "y" }],
        }));

        let record = FlattenMarshaller::new()
            .with_json_kinds(vec![FieldKind::Text])
            .marshall(&fields, &document)
            .unwrap();

        assert_eq!(record["tags"], json!("[\"a\",\"b\"]"));
        assert_eq!(record["title"], json!("Title"));
        assert_eq!(record["comments.text"], json!("[\"x\",\"y\"]"));
    }

    #[test]
    fn test_separator() {
        let fields = vec![
            Field::identifier("id"),
            Field::object("footer", vec![Field::text("title")]),
        ];
        let document = doc(json!({ "id": "1", "footer": { "title": "Footer" } }));

        let record = FlattenMarshaller::new()
            .with_separator("__")
            .marshall(&fields, &document)
            .unwrap();

        assert_eq!(record["footer__title"], json!("Footer"));
    }

    #[test]
    fn test_unmarshall_without_source() {
        let record = doc(json!({ "id": "1" }));
        assert!(matches!(
            FlattenMarshaller::new().unmarshall(&[], &record),
            Err(SearchError::MarshallingError(_))
        ));
    }
}
