use serde::{Deserialize, Deserializer};

pub mod field;
pub mod form;
pub mod rule;

pub use field::{Control, Field, FieldOption, FieldProps, FieldType, FieldValidation};
pub use form::{
    FormConfig, FormSchema, FormVersion, Section, SubmissionSettings, UiSettings, flatten_fields,
};
pub use rule::{Action, ActionType, Condition, ConditionalRule, Operator};

/// Reads an explicit JSON `null` the same as a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
