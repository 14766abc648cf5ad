use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Key marking a file handle inside JSON value files.
pub const FILE_KEY: &str = "$file";

/// Current value of every field, keyed by field id.
pub type Values = BTreeMap<String, FieldValue>;

#[derive(Debug, Error, PartialEq)]
pub enum ValueError {
    #[error("objects are not valid field values (use {{\"$file\": \"path\"}} for files)")]
    UnsupportedObject,
    #[error("file handle is missing a path")]
    MissingPath,
}

/// A local file selected for a file/image field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileHandle {
    pub path: PathBuf,
    pub name: String,
    pub content_type: Option<String>,
}

impl FileHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            name,
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert(
            FILE_KEY.into(),
            Value::String(self.path.display().to_string()),
        );
        map.insert("name".into(), Value::String(self.name.clone()));
        if let Some(content_type) = &self.content_type {
            map.insert("content_type".into(), Value::String(content_type.clone()));
        }
        Value::Object(map)
    }

    fn from_json(map: &Map<String, Value>) -> Result<Self, ValueError> {
        let path = map
            .get(FILE_KEY)
            .and_then(Value::as_str)
            .ok_or(ValueError::MissingPath)?;
        let mut handle = FileHandle::new(path);
        if let Some(name) = map.get("name").and_then(Value::as_str) {
            handle.name = name.to_string();
        }
        handle.content_type = map
            .get("content_type")
            .and_then(Value::as_str)
            .map(String::from);
        Ok(handle)
    }
}

/// A value entered for a field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    List(Vec<FieldValue>),
    File(FileHandle),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Numeric value; `None` for non-finite input.
    pub fn number(value: f64) -> Option<Self> {
        Number::from_f64(value).map(|number| {
            if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
                FieldValue::Number(Number::from(value as i64))
            } else {
                FieldValue::Number(number)
            }
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// True if this value, or any list item, is a file handle.
    pub fn has_files(&self) -> bool {
        match self {
            FieldValue::File(_) => true,
            FieldValue::List(items) => items.iter().any(FieldValue::has_files),
            _ => false,
        }
    }

    pub fn files(&self) -> Vec<&FileHandle> {
        match self {
            FieldValue::File(handle) => vec![handle],
            FieldValue::List(items) => items.iter().flat_map(FieldValue::files).collect(),
            _ => Vec::new(),
        }
    }

    /// Text form used for multipart parts and option matching.
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(flag) => flag.to_string(),
            FieldValue::Number(number) => number_text(number),
            FieldValue::Text(text) => text.clone(),
            FieldValue::List(items) => items
                .iter()
                .map(FieldValue::to_text)
                .collect::<Vec<_>>()
                .join(","),
            FieldValue::File(handle) => handle.name.clone(),
        }
    }

    /// Strict equality against a JSON literal from a rule.
    ///
    /// Numbers compare by numeric value; every other pairing must share a type.
    /// Files compare by path against `{"$file": ...}` literals.
    pub fn equals_literal(&self, literal: &Value) -> bool {
        match (self, literal) {
            (FieldValue::Null, Value::Null) => true,
            (FieldValue::Bool(left), Value::Bool(right)) => left == right,
            (FieldValue::Number(left), Value::Number(right)) => numbers_equal(left, right),
            (FieldValue::Text(left), Value::String(right)) => left == right,
            (FieldValue::List(left), Value::Array(right)) => {
                left.len() == right.len()
                    && left
                        .iter()
                        .zip(right)
                        .all(|(item, literal)| item.equals_literal(literal))
            }
            (FieldValue::File(handle), Value::Object(map)) => map
                .get(FILE_KEY)
                .and_then(Value::as_str)
                .is_some_and(|path| Path::new(path) == handle.path),
            _ => false,
        }
    }

    /// Numeric coercion; NaN when the value has no numeric reading.
    pub fn to_number(&self) -> f64 {
        match self {
            FieldValue::Null => 0.0,
            FieldValue::Bool(flag) => f64::from(u8::from(*flag)),
            FieldValue::Number(number) => number.as_f64().unwrap_or(f64::NAN),
            FieldValue::Text(text) => parse_numeric_text(text),
            FieldValue::List(items) => match items.as_slice() {
                [] => 0.0,
                [single] => parse_numeric_text(&single.to_text()),
                _ => f64::NAN,
            },
            FieldValue::File(_) => f64::NAN,
        }
    }
}

/// Integral floats print without a fraction, so `30.0` reads as `30`.
fn number_text(number: &Number) -> String {
    match number.as_f64() {
        Some(value)
            if !number.is_i64() && !number.is_u64() && value.fract() == 0.0 && value.abs() < 1e21 =>
        {
            format!("{value:.0}")
        }
        _ => number.to_string(),
    }
}

fn numbers_equal(left: &Number, right: &Number) -> bool {
    match (left.as_i64(), right.as_i64()) {
        (Some(left), Some(right)) => left == right,
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(left), Some(right)) => left == right,
            _ => left == right,
        },
    }
}

/// Numeric coercion of a JSON literal, mirroring [`FieldValue::to_number`].
pub fn literal_to_number(literal: &Value) -> f64 {
    match literal {
        Value::Null => 0.0,
        Value::Bool(flag) => f64::from(u8::from(*flag)),
        Value::Number(number) => number.as_f64().unwrap_or(f64::NAN),
        Value::String(text) => parse_numeric_text(text),
        Value::Array(items) => match items.as_slice() {
            [] => 0.0,
            [single] => parse_numeric_text(&literal_text(single)),
            _ => f64::NAN,
        },
        Value::Object(_) => f64::NAN,
    }
}

fn literal_text(literal: &Value) -> String {
    match literal {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items.iter().map(literal_text).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

/// Truthiness of a JSON literal: false, 0, NaN, "" and null are false.
pub fn literal_truthy(literal: &Value) -> bool {
    match literal {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|value| value != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Parses text the way a lenient numeric field would: surrounding whitespace
/// is ignored, empty text is zero, and anything unparseable is NaN.
fn parse_numeric_text(raw: &str) -> f64 {
    let text = raw.trim();
    if text.is_empty() {
        return 0.0;
    }
    match text {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = text.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix)
                .map(|value| value as f64)
                .unwrap_or(f64::NAN);
        }
    }
    let decimal = text
        .chars()
        .all(|ch| ch.is_ascii_digit() || matches!(ch, '.' | '+' | '-' | 'e' | 'E'));
    if !decimal {
        return f64::NAN;
    }
    text.parse::<f64>().unwrap_or(f64::NAN)
}

impl TryFrom<Value> for FieldValue {
    type Error = ValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Ok(match value {
            Value::Null => FieldValue::Null,
            Value::Bool(flag) => FieldValue::Bool(flag),
            Value::Number(number) => FieldValue::Number(number),
            Value::String(text) => FieldValue::Text(text),
            Value::Array(items) => FieldValue::List(
                items
                    .into_iter()
                    .map(FieldValue::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) if map.contains_key(FILE_KEY) => {
                FieldValue::File(FileHandle::from_json(&map)?)
            }
            Value::Object(_) => return Err(ValueError::UnsupportedObject),
        })
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(flag) => Value::Bool(flag),
            FieldValue::Number(number) => Value::Number(number),
            FieldValue::Text(text) => Value::String(text),
            FieldValue::List(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            FieldValue::File(handle) => handle.to_json(),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(flag: bool) -> Self {
        FieldValue::Bool(flag)
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        FieldValue::Text(text.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> Self {
        FieldValue::Text(text)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(Number::from(value))
    }
}

impl From<FileHandle> for FieldValue {
    fn from(handle: FileHandle) -> Self {
        FieldValue::File(handle)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        FieldValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Text(text) => write!(f, "{text}"),
            FieldValue::List(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            FieldValue::File(handle) => write!(f, "<file {}>", handle.path.display()),
            other => write!(f, "{}", other.to_text()),
        }
    }
}

/// Decodes a JSON object into a values map.
pub fn values_from_json(value: Value) -> Result<Values, serde_json::Error> {
    serde_json::from_value(value)
}
