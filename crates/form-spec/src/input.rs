use serde_json::Value;
use thiserror::Error;

use crate::spec::field::{Control, Field, FieldOption};
use crate::value::{FieldValue, FileHandle};

/// Raw text that cannot be turned into a value for a field.
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("'{raw}' is not a number")]
    NotANumber { raw: String },
    #[error("'{raw}' is not a yes/no answer")]
    NotABoolean { raw: String },
    #[error("'{raw}' is not one of the options: {options}")]
    UnknownOption { raw: String, options: String },
}

/// Coerces raw user text into a value, using the field's control.
///
/// Empty input clears the field (null), except for switches where it means
/// `false` and checkbox groups where it means no selection.
pub fn parse_input(field: &Field, raw: &str) -> Result<FieldValue, InputError> {
    let trimmed = raw.trim();
    match field.control() {
        Control::TextInput | Control::Textarea { .. } | Control::DateInput => Ok(if raw.is_empty() {
            FieldValue::Null
        } else {
            FieldValue::text(raw)
        }),
        Control::NumberInput => {
            if trimmed.is_empty() {
                return Ok(FieldValue::Null);
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(FieldValue::number)
                .ok_or_else(|| InputError::NotANumber {
                    raw: trimmed.to_string(),
                })
        }
        Control::Select => {
            if trimmed.is_empty() {
                return Ok(FieldValue::Null);
            }
            Ok(match find_option(&field.options, trimmed) {
                Some(option) => option_value(option),
                None => FieldValue::text(trimmed),
            })
        }
        Control::CheckboxGroup => {
            let mut selected = Vec::new();
            for entry in trimmed.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
                let option =
                    find_option(&field.options, entry).ok_or_else(|| InputError::UnknownOption {
                        raw: entry.to_string(),
                        options: describe_options(&field.options),
                    })?;
                let value = option_value(option);
                if !selected.contains(&value) {
                    selected.push(value);
                }
            }
            Ok(FieldValue::List(selected))
        }
        Control::Switch => parse_switch(trimmed),
        Control::FileInput { multiple, .. } => {
            let mut handles = trimmed
                .split(',')
                .map(str::trim)
                .filter(|path| !path.is_empty())
                .map(|path| FieldValue::File(FileHandle::new(path)));
            if multiple {
                let files: Vec<_> = handles.collect();
                Ok(if files.is_empty() {
                    FieldValue::Null
                } else {
                    FieldValue::List(files)
                })
            } else {
                Ok(handles.next().unwrap_or(FieldValue::Null))
            }
        }
    }
}

fn parse_switch(raw: &str) -> Result<FieldValue, InputError> {
    match raw.to_lowercase().as_str() {
        "" | "no" | "n" | "false" | "f" | "0" | "off" => Ok(FieldValue::Bool(false)),
        "yes" | "y" | "true" | "t" | "1" | "on" => Ok(FieldValue::Bool(true)),
        _ => Err(InputError::NotABoolean {
            raw: raw.to_string(),
        }),
    }
}

/// Adds or removes one option value in a checkbox group selection.
pub fn toggle_option(current: &FieldValue, option: &Value, checked: bool) -> FieldValue {
    let mut items: Vec<FieldValue> = current.as_list().map(<[_]>::to_vec).unwrap_or_default();
    let Ok(value) = FieldValue::try_from(option.clone()) else {
        return FieldValue::List(items);
    };
    if checked {
        if !items.contains(&value) {
            items.push(value);
        }
    } else {
        items.retain(|item| item != &value);
    }
    FieldValue::List(items)
}

fn find_option<'a>(options: &'a [FieldOption], raw: &str) -> Option<&'a FieldOption> {
    options
        .iter()
        .find(|option| option_text(&option.value) == raw)
        .or_else(|| options.iter().find(|option| option.label == raw))
}

fn option_value(option: &FieldOption) -> FieldValue {
    FieldValue::try_from(option.value.clone()).unwrap_or_else(|_| FieldValue::text(&option.label))
}

/// Text form of an option value, as it appears in a select control.
pub fn option_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn describe_options(options: &[FieldOption]) -> String {
    options
        .iter()
        .map(|option| option_text(&option.value))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::field::{FieldProps, FieldType};
    use serde_json::json;

    fn field(kind: FieldType, options: Vec<FieldOption>) -> Field {
        Field {
            id: "f".into(),
            kind,
            label: "F".into(),
            grid_width: None,
            placeholder: None,
            options,
            validations: None,
            props: None,
        }
    }

    fn options() -> Vec<FieldOption> {
        vec![
            FieldOption {
                label: "One".into(),
                value: json!(1),
            },
            FieldOption {
                label: "Yes".into(),
                value: json!(true),
            },
            FieldOption {
                label: "Red".into(),
                value: json!("red"),
            },
        ]
    }

    #[test]
    fn text_clears_on_empty() {
        let text = field(FieldType::Text, vec![]);
        assert_eq!(parse_input(&text, ""), Ok(FieldValue::Null));
        assert_eq!(parse_input(&text, "hi"), Ok(FieldValue::text("hi")));
    }

    #[test]
    fn numbers_are_parsed_or_rejected() {
        let number = field(FieldType::Number, vec![]);
        assert_eq!(parse_input(&number, " 42 "), Ok(FieldValue::from(42i64)));
        assert_eq!(parse_input(&number, ""), Ok(FieldValue::Null));
        assert!(matches!(
            parse_input(&number, "forty"),
            Err(InputError::NotANumber { .. })
        ));
    }

    #[test]
    fn select_keeps_typed_option_values() {
        let select = field(FieldType::Select, options());
        assert_eq!(parse_input(&select, "1"), Ok(FieldValue::from(1i64)));
        assert_eq!(parse_input(&select, "true"), Ok(FieldValue::Bool(true)));
        assert_eq!(parse_input(&select, "Red"), Ok(FieldValue::text("red")));
        assert_eq!(parse_input(&select, "other"), Ok(FieldValue::text("other")));
    }

    #[test]
    fn checkbox_group_collects_known_options() {
        let group = field(FieldType::CheckboxGroup, options());
        assert_eq!(
            parse_input(&group, "red, 1"),
            Ok(FieldValue::List(vec![FieldValue::text("red"), FieldValue::from(1i64)]))
        );
        assert_eq!(parse_input(&group, ""), Ok(FieldValue::List(vec![])));
        assert!(parse_input(&group, "blue").is_err());
    }

    #[test]
    fn multiple_file_fields_collect_handles() {
        let mut files = field(FieldType::File, vec![]);
        files.props = Some(FieldProps {
            multiple: true,
            ..FieldProps::default()
        });
        let value = parse_input(&files, "/tmp/a.pdf, /tmp/b.pdf").expect("files");
        assert_eq!(value.files().len(), 2);
        let single = field(FieldType::Image, vec![]);
        assert!(matches!(
            parse_input(&single, "/tmp/a.png, /tmp/b.png"),
            Ok(FieldValue::File(handle)) if handle.name == "a.png"
        ));
    }

    #[test]
    fn toggle_adds_and_removes() {
        let current = FieldValue::from(vec!["a"]);
        let added = toggle_option(&current, &json!("b"), true);
        assert_eq!(added, FieldValue::from(vec!["a", "b"]));
        let removed = toggle_option(&added, &json!("a"), false);
        assert_eq!(removed, FieldValue::from(vec!["b"]));
        assert_eq!(
            toggle_option(&FieldValue::Null, &json!("x"), true),
            FieldValue::from(vec!["x"])
        );
    }
}
