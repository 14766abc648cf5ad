use serde_json::{Map, Value, json};

use crate::input::option_text;
use crate::session::{FormSession, SubmitState};
use crate::spec::field::{Control, FieldOption, FieldValidation};
use crate::validate::is_empty_value;
use crate::value::FieldValue;

/// Status labels returned by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// Some visible required field is still empty.
    NeedInput,
    /// Every visible required field is filled.
    Complete,
    /// Errors are recorded on the session.
    Error,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Complete => "complete",
            RenderStatus::Error => "error",
        }
    }
}

/// Filled/total counters over visible required fields.
#[derive(Debug, Clone)]
pub struct RenderProgress {
    pub filled: usize,
    pub total: usize,
}

/// Describes a single field for render outputs.
#[derive(Debug, Clone)]
pub struct RenderField {
    pub id: String,
    pub section: String,
    pub label: String,
    pub kind: String,
    pub control: Control,
    pub required: bool,
    pub visible: bool,
    pub placeholder: Option<String>,
    pub current_value: Option<FieldValue>,
    pub error: Option<String>,
    pub options: Vec<FieldOption>,
    pub validations: Option<FieldValidation>,
}

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub version_id: u64,
    pub form_title: String,
    pub status: RenderStatus,
    pub submit_state: SubmitState,
    pub submit_label: String,
    pub progress: RenderProgress,
    pub fields: Vec<RenderField>,
}

/// Build the renderer payload from the current session snapshot.
pub fn build_render_payload(session: &FormSession) -> RenderPayload {
    let version = session.version();
    let state = session.field_state();

    let fields = version
        .sections()
        .iter()
        .flat_map(|section| {
            section.fields.iter().map(|field| RenderField {
                id: field.id.clone(),
                section: section.title.clone(),
                label: field.display_label().to_string(),
                kind: field.kind.as_str().to_string(),
                control: field.control(),
                required: state.is_required(&field.id),
                visible: state.is_visible(&field.id),
                placeholder: field.placeholder().map(String::from),
                current_value: session.value(&field.id).cloned(),
                error: session.error(&field.id).map(String::from),
                options: field.options.clone(),
                validations: field.validations.clone(),
            })
        })
        .collect::<Vec<_>>();

    let required_visible = fields
        .iter()
        .filter(|field| field.visible && field.required);
    let total = required_visible.clone().count();
    let filled = required_visible
        .filter(|field| !is_empty_value(field.current_value.as_ref()))
        .count();

    let status = if !session.errors().is_empty() {
        RenderStatus::Error
    } else if filled < total {
        RenderStatus::NeedInput
    } else {
        RenderStatus::Complete
    };

    RenderPayload {
        version_id: version.id,
        form_title: version.title().to_string(),
        status,
        submit_state: session.submit_state().clone(),
        submit_label: session.submit_label().to_string(),
        progress: RenderProgress { filled, total },
        fields,
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let fields = payload
        .fields
        .iter()
        .map(|field| {
            let mut map = Map::new();
            map.insert("id".into(), Value::String(field.id.clone()));
            map.insert("section".into(), Value::String(field.section.clone()));
            map.insert("label".into(), Value::String(field.label.clone()));
            map.insert("type".into(), Value::String(field.kind.clone()));
            map.insert("control".into(), control_json(&field.control));
            map.insert("required".into(), Value::Bool(field.required));
            map.insert("visible".into(), Value::Bool(field.visible));
            if let Some(placeholder) = &field.placeholder {
                map.insert("placeholder".into(), Value::String(placeholder.clone()));
            }
            if let Some(value) = &field.current_value {
                map.insert("current_value".into(), Value::from(value.clone()));
            }
            if let Some(error) = &field.error {
                map.insert("error".into(), Value::String(error.clone()));
            }
            if !field.options.is_empty() {
                map.insert(
                    "options".into(),
                    Value::Array(
                        field
                            .options
                            .iter()
                            .map(|option| json!({ "label": option.label, "value": option.value }))
                            .collect(),
                    ),
                );
            }
            if let Some(validations) = &field.validations {
                map.insert(
                    "validations".into(),
                    serde_json::to_value(validations).unwrap_or(Value::Null),
                );
            }
            Value::Object(map)
        })
        .collect::<Vec<_>>();

    let mut submit = Map::new();
    submit.insert("state".into(), Value::String(payload.submit_state.as_str().into()));
    submit.insert("label".into(), Value::String(payload.submit_label.clone()));
    match &payload.submit_state {
        SubmitState::Succeeded {
            message,
            redirect_url,
        } => {
            submit.insert("message".into(), Value::String(message.clone()));
            if let Some(url) = redirect_url {
                submit.insert("redirect_url".into(), Value::String(url.clone()));
            }
        }
        SubmitState::Failed { message } => {
            submit.insert("message".into(), Value::String(message.clone()));
        }
        SubmitState::Idle | SubmitState::Submitting => {}
    }

    json!({
        "version_id": payload.version_id,
        "form_title": payload.form_title,
        "status": payload.status.as_str(),
        "progress": {
            "filled": payload.progress.filled,
            "total": payload.progress.total,
        },
        "submit": Value::Object(submit),
        "fields": fields,
    })
}

fn control_json(control: &Control) -> Value {
    match control {
        Control::Textarea { rows } => json!({ "kind": control.as_str(), "rows": rows }),
        Control::FileInput { multiple, accept } => json!({
            "kind": control.as_str(),
            "multiple": multiple,
            "accept": accept,
        }),
        other => json!({ "kind": other.as_str() }),
    }
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Form: {} (version {})",
        payload.form_title, payload.version_id
    ));
    lines.push(format!(
        "Status: {} ({}/{} required filled)",
        payload.status.as_str(),
        payload.progress.filled,
        payload.progress.total
    ));

    let mut current_section: Option<&str> = None;
    for field in payload.fields.iter().filter(|field| field.visible) {
        if current_section != Some(field.section.as_str()) {
            current_section = Some(field.section.as_str());
            if !field.section.is_empty() {
                lines.push(format!("[{}]", field.section));
            }
        }
        let mut entry = format!(" - {} ({})", field.id, field.label);
        if field.required {
            entry.push_str(" [required]");
        }
        if let Some(value) = field.current_value.as_ref().filter(|value| !value.is_null()) {
            entry.push_str(&format!(" = {}", value));
        }
        lines.push(entry);
        if !field.options.is_empty() {
            let options = field
                .options
                .iter()
                .map(|option| format!("{}={}", option_text(&option.value), option.label))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!("     options: {}", options));
        }
        if let Some(error) = &field.error {
            lines.push(format!("     error: {}", error));
        }
    }

    let hidden = payload.fields.iter().filter(|field| !field.visible).count();
    if hidden > 0 {
        lines.push(format!("Hidden fields: {}", hidden));
    }

    match &payload.submit_state {
        SubmitState::Succeeded { message, .. } => lines.push(format!("Submitted: {}", message)),
        SubmitState::Failed { message } => lines.push(format!("Submission failed: {}", message)),
        SubmitState::Idle | SubmitState::Submitting => {
            lines.push(format!("Action: {}", payload.submit_label))
        }
    }

    lines.join("\n")
}
