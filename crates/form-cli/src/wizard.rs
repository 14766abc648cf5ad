use form_spec::input::option_text;
use form_spec::{
    Control, Field, FormSession, InputError, RenderField, RenderPayload, RenderStatus,
    SubmitState, ValidationErrors,
};

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: field prompts only.
    Clean,
    /// Verbose output: status, visible fields, parse expectations.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints prompts and feedback while the wizard walks the visible fields.
pub struct WizardPresenter {
    verbosity: Verbosity,
    header_printed: bool,
    show_answers_json: bool,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, show_answers_json: bool) -> Self {
        Self {
            verbosity,
            header_printed: false,
            show_answers_json,
        }
    }

    pub fn show_header(&mut self, payload: &RenderPayload) {
        if self.header_printed {
            return;
        }
        println!("Form: {}", payload.form_title);
        if self.verbosity.is_verbose() {
            println!("Version: {}", payload.version_id);
            println!("Type 'exit' to abort, 'reset' to restore the defaults.");
        }
        self.header_printed = true;
    }

    pub fn show_status(&self, payload: &RenderPayload) {
        if self.verbosity.is_verbose() {
            println!(
                "Status: {} ({}/{})",
                payload.status.as_str(),
                payload.progress.filled,
                payload.progress.total
            );
            self.print_visible_fields(payload);
        } else if payload.status == RenderStatus::NeedInput
            && !payload.fields.iter().any(|field| field.visible)
        {
            println!("No visible fields are available; check your conditional logic.");
        }
    }

    fn print_visible_fields(&self, payload: &RenderPayload) {
        println!("Visible fields:");
        for field in payload.fields.iter().filter(|field| field.visible) {
            let mut entry = format!(" - {} ({})", field.id, field.label);
            if field.required {
                entry.push_str(" [required]");
            }
            println!("{}", entry);
        }
    }

    pub fn show_prompt(&self, prompt: &PromptContext) {
        let mut line = format!("{}/{} {}", prompt.index, prompt.total, prompt.label);
        if prompt.required {
            line.push_str(" *");
        }
        if let Some(hint) = &prompt.hint {
            line.push(' ');
            line.push_str(hint);
        }
        println!("{}", line);
        if let Some(current) = &prompt.current {
            println!("Current: {}", current);
        }
        if self.verbosity.is_verbose() && !prompt.choices.is_empty() {
            println!("Choices: {}", prompt.choices.join(", "));
        }
    }

    pub fn show_parse_error(&self, error: &InputError) {
        eprintln!("Invalid answer: {}", error);
    }

    pub fn show_required(&self, label: &str) {
        eprintln!("{} is required.", label);
    }

    pub fn show_errors(&self, errors: &ValidationErrors) {
        eprintln!("Please fix the following fields:");
        for (field_id, message) in errors {
            eprintln!("  {} - {}", field_id, message);
        }
    }

    pub fn show_reset(&self) {
        println!("Values restored to their defaults.");
    }

    pub fn show_completion(&self, session: &FormSession) {
        println!("Done ✅");
        if self.show_answers_json {
            match serde_json::to_string_pretty(&session.payload().to_json()) {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => eprintln!("Failed to serialize answers to JSON: {}", err),
            }
        }
    }

    pub fn show_submit_state(&self, state: &SubmitState) {
        match state {
            SubmitState::Succeeded {
                message,
                redirect_url,
            } => {
                println!("Submitted: {}", message);
                if let Some(url) = redirect_url {
                    println!("Continue at: {}", url);
                }
            }
            SubmitState::Failed { message } => eprintln!("Submission failed: {}", message),
            SubmitState::Idle | SubmitState::Submitting => {}
        }
    }
}

/// Context used to format a single prompt.
pub struct PromptContext {
    pub index: usize,
    pub total: usize,
    pub label: String,
    pub required: bool,
    pub hint: Option<String>,
    pub current: Option<String>,
    pub choices: Vec<String>,
}

impl PromptContext {
    pub fn new(field: &Field, render: &RenderField, index: usize, total: usize) -> Self {
        let choices = field
            .options
            .iter()
            .map(|option| option_text(&option.value))
            .collect::<Vec<_>>();
        let current = render
            .current_value
            .as_ref()
            .filter(|value| !value.is_null())
            .map(|value| value.to_string());
        Self {
            index: index.max(1),
            total: total.max(index),
            label: render.label.clone(),
            required: render.required,
            hint: control_hint(&render.control, &choices, render.placeholder.as_deref()),
            current,
            choices,
        }
    }
}

fn control_hint(control: &Control, choices: &[String], placeholder: Option<&str>) -> Option<String> {
    match control {
        Control::Switch => Some("(yes/no)".to_string()),
        Control::NumberInput => Some("(number)".to_string()),
        Control::DateInput => Some("(YYYY-MM-DD)".to_string()),
        Control::Select if !choices.is_empty() => Some(format!("({})", choices.join("/"))),
        Control::CheckboxGroup => Some(format!(
            "(comma-separated: {}; +value/-value toggles one)",
            choices.join(", ")
        )),
        Control::FileInput { multiple: true, .. } => Some("(comma-separated file paths)".to_string()),
        Control::FileInput { .. } => Some("(file path)".to_string()),
        _ => placeholder.map(|placeholder| format!("({})", placeholder)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_follow_controls() {
        let choices = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            control_hint(&Control::Select, &choices, None).as_deref(),
            Some("(a/b)")
        );
        assert_eq!(
            control_hint(&Control::TextInput, &[], Some("Jane Doe")).as_deref(),
            Some("(Jane Doe)")
        );
        assert_eq!(control_hint(&Control::TextInput, &[], None), None);
        assert_eq!(
            control_hint(
                &Control::FileInput {
                    multiple: true,
                    accept: None
                },
                &[],
                None
            )
            .as_deref(),
            Some("(comma-separated file paths)")
        );
    }
}
