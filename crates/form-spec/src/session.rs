use crate::defaults::initial_values;
use crate::field_state::{FieldState, RequiredMap, base_required, derive_field_state};
use crate::payload::SubmissionPayload;
use crate::spec::field::Field;
use crate::spec::form::{FormVersion, SUBMITTING_TEXT};
use crate::validate::{ValidationErrors, validate};
use crate::value::{FieldValue, Values};
use crate::visibility::{VisibleFields, visible_fields};

/// Whole-form submission progress.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmitState {
    #[default]
    Idle,
    Submitting,
    Succeeded {
        message: String,
        redirect_url: Option<String>,
    },
    Failed {
        message: String,
    },
}

impl SubmitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmitState::Idle => "idle",
            SubmitState::Submitting => "submitting",
            SubmitState::Succeeded { .. } => "success",
            SubmitState::Failed { .. } => "error",
        }
    }
}

/// One page session over a loaded form version.
///
/// The session is the single writer of the values map. Field state is never
/// cached: every read derives it from the current snapshot, so the latest
/// value change is always reflected.
#[derive(Debug, Clone)]
pub struct FormSession {
    version: FormVersion,
    base_required: RequiredMap,
    values: Values,
    pristine: Values,
    errors: ValidationErrors,
    submit: SubmitState,
}

impl FormSession {
    pub fn new(version: FormVersion) -> Self {
        let base_required = base_required(version.sections());
        let pristine = initial_values(version.fields());
        Self {
            version,
            base_required,
            values: pristine.clone(),
            pristine,
            errors: ValidationErrors::new(),
            submit: SubmitState::Idle,
        }
    }

    /// Replaces the schema and re-seeds every value from its defaults.
    pub fn reload(&mut self, version: FormVersion) {
        tracing::debug!(version = version.id, "reloading form session");
        *self = Self::new(version);
    }

    pub fn version(&self) -> &FormVersion {
        &self.version
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.version.fields()
    }

    pub fn base_required(&self) -> &RequiredMap {
        &self.base_required
    }

    pub fn values(&self) -> &Values {
        &self.values
    }

    pub fn pristine_values(&self) -> &Values {
        &self.pristine
    }

    pub fn value(&self, field_id: &str) -> Option<&FieldValue> {
        self.values.get(field_id)
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn error(&self, field_id: &str) -> Option<&str> {
        self.errors.get(field_id).map(String::as_str)
    }

    pub fn submit_state(&self) -> &SubmitState {
        &self.submit
    }

    /// Stores a value and clears any error recorded for that field.
    pub fn set_value(&mut self, field_id: impl Into<String>, value: FieldValue) {
        let field_id = field_id.into();
        self.errors.remove(&field_id);
        self.values.insert(field_id, value);
    }

    /// Applies a batch of values, in key order.
    pub fn set_values(&mut self, values: Values) {
        for (field_id, value) in values {
            self.set_value(field_id, value);
        }
    }

    pub fn field_state(&self) -> FieldState {
        derive_field_state(
            self.version.sections(),
            &self.version.config,
            &self.values,
            &self.base_required,
        )
    }

    pub fn visible_fields(&self) -> VisibleFields {
        visible_fields(self.version.fields(), &self.field_state().visibility)
    }

    /// Checks the visible required fields without storing the result.
    pub fn check(&self) -> ValidationErrors {
        validate(self.version.fields(), &self.field_state(), &self.values)
    }

    /// Replaces stored errors with a fresh validation. Returns `true` when valid.
    pub fn validate(&mut self) -> bool {
        self.errors = self.check();
        self.errors.is_empty()
    }

    pub fn payload(&self) -> SubmissionPayload {
        SubmissionPayload::build(self.version.fields(), &self.visible_fields(), &self.values)
    }

    /// Validates and, if clean, enters `Submitting` and returns the payload.
    ///
    /// On failure the errors are stored and returned; the submit state is left
    /// untouched.
    pub fn begin_submit(&mut self) -> Result<SubmissionPayload, ValidationErrors> {
        if !self.validate() {
            tracing::debug!(errors = self.errors.len(), "submission blocked by validation");
            return Err(self.errors.clone());
        }
        self.submit = SubmitState::Submitting;
        Ok(self.payload())
    }

    /// Records the result of a submission. Entered values are kept either way.
    pub fn finish_submit(&mut self, outcome: Result<(), String>) {
        self.submit = match outcome {
            Ok(()) => {
                let settings = &self.version.config.submission_settings;
                SubmitState::Succeeded {
                    message: self.version.config.success_message().to_string(),
                    redirect_url: settings.redirect_url.clone(),
                }
            }
            Err(message) => {
                tracing::warn!(%message, "submission failed");
                SubmitState::Failed { message }
            }
        };
    }

    /// Applies an upload result: the uploaded value on success, otherwise the
    /// field is cleared and a field-scoped error is stored.
    pub fn record_upload(&mut self, field_id: &str, outcome: Result<FieldValue, String>) {
        match outcome {
            Ok(value) => self.set_value(field_id, value),
            Err(message) => {
                tracing::warn!(field = field_id, %message, "upload failed");
                self.values.insert(field_id.to_string(), FieldValue::Null);
                self.errors.insert(field_id.to_string(), message);
            }
        }
    }

    /// Restores every field to its initial value.
    pub fn reset(&mut self) {
        self.values = self.pristine.clone();
        self.errors.clear();
        self.submit = SubmitState::Idle;
    }

    pub fn submit_label(&self) -> &str {
        match self.submit {
            SubmitState::Submitting => SUBMITTING_TEXT,
            _ => self.version.config.submit_button_text(),
        }
    }
}
