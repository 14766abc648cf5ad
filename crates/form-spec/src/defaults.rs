use crate::spec::field::{Field, FieldType};
use crate::value::{FieldValue, Values};

/// Initial value for one field: the declared default, else `false` for
/// switches and `null` for everything else.
pub fn initial_value(field: &Field) -> FieldValue {
    let fallback = match field.kind {
        FieldType::Switch => FieldValue::Bool(false),
        _ => FieldValue::Null,
    };
    match field.default_value() {
        Some(default) => FieldValue::try_from(default.clone()).unwrap_or_else(|err| {
            tracing::warn!(field = %field.id, error = %err, "ignoring unusable default value");
            fallback
        }),
        None => fallback,
    }
}

/// Seeds both the current and the pristine values of a form session.
pub fn initial_values<'a>(fields: impl IntoIterator<Item = &'a Field>) -> Values {
    fields
        .into_iter()
        .map(|field| (field.id.clone(), initial_value(field)))
        .collect()
}
