use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::spec::field::Field;
use crate::spec::rule::ConditionalRule;

pub const DEFAULT_FORM_TITLE: &str = "Form";
pub const DEFAULT_SUBMIT_TEXT: &str = "Submit";
pub const SUBMITTING_TEXT: &str = "Submitting...";
pub const DEFAULT_SUCCESS_MESSAGE: &str = "Form submitted successfully";

/// Presentation-only grouping of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Section {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "crate::spec::null_as_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "crate::spec::null_as_default")]
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct UiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_variant: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct FormSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_settings: Option<UiSettings>,
    #[serde(default, deserialize_with = "crate::spec::null_as_default")]
    pub sections: Vec<Section>,
}

/// Iterates every field of every section in declaration order.
pub fn flatten_fields(sections: &[Section]) -> impl Iterator<Item = &Field> {
    sections.iter().flat_map(|section| section.fields.iter())
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct SubmissionSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_button_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

/// Rules and submission copy attached to a form version.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct FormConfig {
    #[serde(
        default,
        deserialize_with = "crate::spec::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub conditional_logic: Vec<ConditionalRule>,
    #[serde(default, deserialize_with = "crate::spec::null_as_default")]
    pub submission_settings: SubmissionSettings,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FormConfig {
    pub fn submit_button_text(&self) -> &str {
        self.submission_settings
            .submit_button_text
            .as_deref()
            .unwrap_or(DEFAULT_SUBMIT_TEXT)
    }

    pub fn success_message(&self) -> &str {
        self.submission_settings
            .success_message
            .as_deref()
            .unwrap_or(DEFAULT_SUCCESS_MESSAGE)
    }
}

/// A published form: schema plus config, identified by a version id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormVersion {
    pub id: u64,
    #[serde(default, deserialize_with = "crate::spec::null_as_default")]
    pub schema: FormSchema,
    #[serde(default, deserialize_with = "crate::spec::null_as_default")]
    pub config: FormConfig,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FormVersion {
    /// Decodes a form version that is either bare or wrapped as `{"data": ...}`.
    pub fn from_response(body: Value) -> Result<Self, serde_json::Error> {
        match body {
            Value::Object(mut map) if map.get("data").is_some_and(|data| !data.is_null()) => {
                let data = map.remove("data").unwrap_or(Value::Null);
                serde_json::from_value(data)
            }
            other => serde_json::from_value(other),
        }
    }

    pub fn sections(&self) -> &[Section] {
        &self.schema.sections
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        flatten_fields(&self.schema.sections)
    }

    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields().find(|field| field.id == id)
    }

    pub fn title(&self) -> &str {
        self.schema
            .ui_settings
            .as_ref()
            .and_then(|settings| settings.form_title.as_deref())
            .unwrap_or(DEFAULT_FORM_TITLE)
    }

    /// Section declaring the given field id.
    pub fn section_of(&self, field_id: &str) -> Option<&Section> {
        self.schema
            .sections
            .iter()
            .find(|section| section.fields.iter().any(|field| field.id == field_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn version_json() -> Value {
        json!({
            "id": 3,
            "schema": {
                "ui_settings": { "form_title": "Intake", "theme": "dark" },
                "sections": [
                    { "title": "One", "fields": [ { "id": "a", "type": "text", "label": "A" } ] }
                ]
            }
        })
    }

    #[test]
    fn from_response_unwraps_data_envelope() {
        let wrapped = FormVersion::from_response(json!({ "data": version_json() })).expect("wrapped");
        let bare = FormVersion::from_response(version_json()).expect("bare");
        assert_eq!(wrapped, bare);
        assert_eq!(bare.title(), "Intake");
        assert_eq!(bare.config, FormConfig::default());
    }

    #[test]
    fn extra_ui_settings_survive_round_trip() {
        let version = FormVersion::from_response(version_json()).expect("bare");
        let encoded = serde_json::to_value(&version).expect("serialize");
        assert_eq!(encoded["schema"]["ui_settings"]["theme"], "dark");
    }

    #[test]
    fn null_keys_read_as_absent() {
        let version = FormVersion::from_response(json!({ "id": 1, "schema": null, "config": null }))
            .expect("null schema and config");
        assert!(version.sections().is_empty());
        assert_eq!(version.config, FormConfig::default());

        let version = FormVersion::from_response(json!({
            "id": 2,
            "schema": {
                "sections": [{
                    "title": null,
                    "fields": [{
                        "id": "upload",
                        "type": "file",
                        "label": null,
                        "options": null,
                        "validations": { "required": null },
                        "props": { "multiple": null }
                    }]
                }]
            },
            "config": {
                "conditional_logic": null,
                "submission_settings": null
            }
        }))
        .expect("null nested keys");
        let field = version.field("upload").expect("field");
        assert_eq!(field.label, "");
        assert!(field.options.is_empty());
        assert_eq!(field.validations.as_ref().map(|v| v.required), Some(false));
        assert_eq!(field.props.as_ref().map(|p| p.multiple), Some(false));
        assert!(version.config.conditional_logic.is_empty());
        assert_eq!(version.config.submit_button_text(), DEFAULT_SUBMIT_TEXT);

        let version = FormVersion::from_response(json!({
            "id": 3,
            "config": {
                "conditional_logic": [{
                    "conditions": { "trigger_field": "a", "operator": "equals", "value": "x" },
                    "actions": null
                }]
            }
        }))
        .expect("null actions");
        assert!(version.config.conditional_logic[0].actions.is_empty());
    }

    #[test]
    fn submission_copy_falls_back() {
        let config = FormConfig::default();
        assert_eq!(config.submit_button_text(), DEFAULT_SUBMIT_TEXT);
        assert_eq!(config.success_message(), DEFAULT_SUCCESS_MESSAGE);
    }
}
