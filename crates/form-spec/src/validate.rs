use std::collections::BTreeMap;

use crate::field_state::FieldState;
use crate::spec::field::Field;
use crate::value::{FieldValue, Values};

pub const REQUIRED_MESSAGE: &str = "This field is required";

/// Field id to error message. Empty means valid.
pub type ValidationErrors = BTreeMap<String, String>;

/// Null, missing, empty text and empty lists count as empty.
pub fn is_empty_value(value: Option<&FieldValue>) -> bool {
    match value {
        None | Some(FieldValue::Null) => true,
        Some(FieldValue::Text(text)) => text.is_empty(),
        Some(FieldValue::List(items)) => items.is_empty(),
        Some(_) => false,
    }
}

/// Reports every visible, required field whose value is empty.
///
/// Hidden or optional fields are never checked, whatever they hold.
pub fn validate<'a>(
    fields: impl IntoIterator<Item = &'a Field>,
    state: &FieldState,
    values: &Values,
) -> ValidationErrors {
    fields
        .into_iter()
        .filter(|field| state.is_visible(&field.id) && state.is_required(&field.id))
        .filter(|field| is_empty_value(values.get(&field.id)))
        .map(|field| (field.id.clone(), REQUIRED_MESSAGE.to_string()))
        .collect()
}
