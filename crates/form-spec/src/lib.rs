#![allow(missing_docs)]

pub mod condition;
pub mod defaults;
pub mod field_state;
pub mod input;
pub mod payload;
pub mod render;
pub mod session;
pub mod spec;
pub mod validate;
pub mod value;
pub mod visibility;

pub use defaults::{initial_value, initial_values};
pub use field_state::{
    FieldState, RequiredMap, VisibilityMap, base_required, derive_field_state,
    show_controlled_fields,
};
pub use input::{InputError, parse_input, toggle_option};
pub use payload::{MultipartPart, PartBody, PayloadEncoding, SubmissionPayload};
pub use render::{
    RenderField, RenderPayload, RenderProgress, RenderStatus, build_render_payload,
    render_json_ui, render_text,
};
pub use session::{FormSession, SubmitState};
pub use spec::{
    Action, ActionType, Condition, ConditionalRule, Control, Field, FieldOption, FieldProps,
    FieldType, FieldValidation, FormConfig, FormSchema, FormVersion, Operator, Section,
    SubmissionSettings, UiSettings,
};
pub use validate::{REQUIRED_MESSAGE, ValidationErrors, is_empty_value, validate};
pub use value::{FieldValue, FileHandle, ValueError, Values, values_from_json};
pub use visibility::{VisibleFields, visible_fields};
