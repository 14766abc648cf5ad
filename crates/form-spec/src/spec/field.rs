use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Input kind declared by the schema.
///
/// Unknown labels are kept verbatim in [`FieldType::Other`] and rendered as
/// plain text inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Text,
    Number,
    Select,
    CheckboxGroup,
    Date,
    File,
    Image,
    Textarea,
    Switch,
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Select => "select",
            FieldType::CheckboxGroup => "checkbox_group",
            FieldType::Date => "date",
            FieldType::File => "file",
            FieldType::Image => "image",
            FieldType::Textarea => "textarea",
            FieldType::Switch => "switch",
            FieldType::Other(label) => label,
        }
    }

    /// True for kinds whose value is one or more file handles.
    pub fn accepts_files(&self) -> bool {
        matches!(self, FieldType::File | FieldType::Image)
    }
}

impl From<String> for FieldType {
    fn from(label: String) -> Self {
        match label.as_str() {
            "text" => FieldType::Text,
            "number" => FieldType::Number,
            "select" => FieldType::Select,
            "checkbox_group" => FieldType::CheckboxGroup,
            "date" => FieldType::Date,
            "file" => FieldType::File,
            "image" => FieldType::Image,
            "textarea" => FieldType::Textarea,
            "switch" => FieldType::Switch,
            _ => FieldType::Other(label),
        }
    }
}

impl From<FieldType> for String {
    fn from(kind: FieldType) -> Self {
        kind.as_str().to_string()
    }
}

/// The input control a field kind is presented with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    TextInput,
    NumberInput,
    Textarea { rows: u32 },
    Select,
    CheckboxGroup,
    Switch,
    DateInput,
    FileInput { multiple: bool, accept: Option<String> },
}

impl Control {
    pub fn as_str(&self) -> &'static str {
        match self {
            Control::TextInput => "text_input",
            Control::NumberInput => "number_input",
            Control::Textarea { .. } => "textarea",
            Control::Select => "select",
            Control::CheckboxGroup => "checkbox_group",
            Control::Switch => "switch",
            Control::DateInput => "date_input",
            Control::FileInput { .. } => "file_input",
        }
    }
}

const DEFAULT_TEXTAREA_ROWS: u32 = 4;

/// Static validation flags. Only `required` feeds the validator; the rest are
/// presentation hints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct FieldValidation {
    #[serde(default, deserialize_with = "crate::spec::null_as_default")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<bool>,
}

/// Opaque control properties.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct FieldProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, deserialize_with = "crate::spec::null_as_default")]
    pub multiple: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size_mb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldOption {
    pub label: String,
    pub value: Value,
}

/// One input unit of a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Field {
    pub id: String,
    #[serde(rename = "type")]
    #[schemars(with = "String")]
    pub kind: FieldType,
    #[serde(default, deserialize_with = "crate::spec::null_as_default")]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_width: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(
        default,
        deserialize_with = "crate::spec::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub options: Vec<FieldOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validations: Option<FieldValidation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<FieldProps>,
}

impl Field {
    /// Label shown to the user, falling back to the id.
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.id
        } else {
            &self.label
        }
    }

    pub fn is_required(&self) -> bool {
        self.validations
            .as_ref()
            .map(|validations| validations.required)
            .unwrap_or(false)
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.props
            .as_ref()
            .and_then(|props| props.default_value.as_ref())
    }

    pub fn is_multiple(&self) -> bool {
        self.props.as_ref().map(|props| props.multiple).unwrap_or(false)
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder
            .as_deref()
            .or_else(|| self.props.as_ref()?.placeholder.as_deref())
    }

    pub fn max_size_bytes(&self) -> Option<u64> {
        let megabytes = self.props.as_ref()?.max_size_mb?;
        if megabytes.is_finite() && megabytes > 0.0 {
            Some((megabytes * 1024.0 * 1024.0) as u64)
        } else {
            None
        }
    }

    pub fn control(&self) -> Control {
        let props = self.props.as_ref();
        match self.kind {
            FieldType::Number => Control::NumberInput,
            FieldType::Textarea => Control::Textarea {
                rows: props.and_then(|props| props.rows).unwrap_or(DEFAULT_TEXTAREA_ROWS),
            },
            FieldType::Select => Control::Select,
            FieldType::CheckboxGroup => Control::CheckboxGroup,
            FieldType::Switch => Control::Switch,
            FieldType::Date => Control::DateInput,
            FieldType::File | FieldType::Image => Control::FileInput {
                multiple: self.is_multiple(),
                accept: props.and_then(|props| props.accept.clone()),
            },
            FieldType::Text | FieldType::Other(_) => Control::TextInput,
        }
    }
}
