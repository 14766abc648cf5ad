use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Value, json};

use crate::spec::field::Field;
use crate::value::{FieldValue, FileHandle, Values};
use crate::visibility::VisibleFields;

/// How a submission body is encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadEncoding {
    Json,
    Multipart,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartBody {
    Text(String),
    File(FileHandle),
}

/// One multipart form entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartPart {
    pub name: String,
    pub body: PartBody,
}

impl MultipartPart {
    fn text(name: String, text: String) -> Self {
        Self {
            name,
            body: PartBody::Text(text),
        }
    }

    fn file(name: String, handle: &FileHandle) -> Self {
        Self {
            name,
            body: PartBody::File(handle.clone()),
        }
    }
}

/// Values of the visible fields, in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubmissionPayload {
    entries: Vec<(String, FieldValue)>,
}

impl SubmissionPayload {
    /// Collects the visible fields' values. Fields without a stored value are
    /// left out.
    pub fn build<'a>(
        fields: impl IntoIterator<Item = &'a Field>,
        visible: &VisibleFields,
        values: &Values,
    ) -> Self {
        let entries = fields
            .into_iter()
            .filter(|field| visible.contains(&field.id))
            .filter_map(|field| {
                values
                    .get(&field.id)
                    .map(|value| (field.id.clone(), value.clone()))
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, field_id: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(id, _)| id == field_id)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(id, value)| (id.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_files(&self) -> bool {
        self.entries.iter().any(|(_, value)| value.has_files())
    }

    pub fn encoding(&self) -> PayloadEncoding {
        if self.has_files() {
            PayloadEncoding::Multipart
        } else {
            PayloadEncoding::Json
        }
    }

    /// JSON body: `{"payload": {field_id: value, ...}}`.
    pub fn to_json(&self) -> Value {
        json!({ "payload": self })
    }

    /// Multipart entries: `payload[id]` for scalars and files,
    /// `payload[id][]` once per list item. Null fields are skipped; a null
    /// list item is sent as the text `null`.
    pub fn multipart_parts(&self) -> Vec<MultipartPart> {
        let mut parts = Vec::new();
        for (id, value) in &self.entries {
            match value {
                FieldValue::Null => {}
                FieldValue::File(handle) => {
                    parts.push(MultipartPart::file(format!("payload[{id}]"), handle));
                }
                FieldValue::List(items) => {
                    let name = format!("payload[{id}][]");
                    for item in items {
                        match item {
                            FieldValue::File(handle) => {
                                parts.push(MultipartPart::file(name.clone(), handle))
                            }
                            FieldValue::Null => {
                                parts.push(MultipartPart::text(name.clone(), "null".to_string()))
                            }
                            other => parts.push(MultipartPart::text(name.clone(), other.to_text())),
                        }
                    }
                }
                scalar => parts.push(MultipartPart::text(format!("payload[{id}]"), scalar.to_text())),
            }
        }
        parts
    }
}

impl Serialize for SubmissionPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, value) in &self.entries {
            map.serialize_entry(id, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FileHandle;

    fn payload(entries: Vec<(&str, FieldValue)>) -> SubmissionPayload {
        SubmissionPayload {
            entries: entries
                .into_iter()
                .map(|(id, value)| (id.to_string(), value))
                .collect(),
        }
    }

    #[test]
    fn list_items_repeat_the_array_key() {
        let payload = payload(vec![
            ("tags", FieldValue::from(vec!["a", "b"])),
            ("agree", FieldValue::Bool(true)),
            ("note", FieldValue::Null),
            ("cv", FieldValue::File(FileHandle::new("/tmp/cv.pdf"))),
        ]);
        assert_eq!(payload.encoding(), PayloadEncoding::Multipart);
        let parts = payload.multipart_parts();
        let names: Vec<_> = parts.iter().map(|part| part.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["payload[tags][]", "payload[tags][]", "payload[agree]", "payload[cv]"]
        );
        assert_eq!(parts[0].body, PartBody::Text("a".into()));
        assert_eq!(parts[1].body, PartBody::Text("b".into()));
        assert_eq!(parts[2].body, PartBody::Text("true".into()));
    }

    #[test]
    fn list_items_use_plain_text() {
        let tags = serde_json::from_value(serde_json::json!(["a", null, 2.0])).expect("tags");
        let age = serde_json::from_value(serde_json::json!(30.0)).expect("age");
        let payload = payload(vec![
            ("age", age),
            ("tags", tags),
            ("cv", FieldValue::File(FileHandle::new("/tmp/cv.pdf"))),
        ]);
        let texts: Vec<_> = payload
            .multipart_parts()
            .into_iter()
            .filter_map(|part| match part.body {
                PartBody::Text(text) => Some((part.name, text)),
                PartBody::File(_) => None,
            })
            .collect();
        assert_eq!(
            texts,
            vec![
                ("payload[age]".to_string(), "30".to_string()),
                ("payload[tags][]".to_string(), "a".to_string()),
                ("payload[tags][]".to_string(), "null".to_string()),
                ("payload[tags][]".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn files_inside_lists_force_multipart() {
        let payload = payload(vec![(
            "photos",
            FieldValue::List(vec![
                FieldValue::File(FileHandle::new("/tmp/a.png")),
                FieldValue::File(FileHandle::new("/tmp/b.png")),
            ]),
        )]);
        assert_eq!(payload.encoding(), PayloadEncoding::Multipart);
        let parts = payload.multipart_parts();
        assert!(matches!(&parts[1].body, PartBody::File(handle) if handle.name == "b.png"));
    }
}
