use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::spec::form::{FormConfig, Section, flatten_fields};
use crate::spec::rule::{ActionType, ConditionalRule};
use crate::value::{Values, literal_truthy};

pub type VisibilityMap = BTreeMap<String, bool>;
pub type RequiredMap = BTreeMap<String, bool>;

/// Per-field visibility and required flags derived from rules and values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FieldState {
    pub visibility: VisibilityMap,
    pub required: RequiredMap,
}

impl FieldState {
    /// Fields without an entry are visible.
    pub fn is_visible(&self, field_id: &str) -> bool {
        self.visibility.get(field_id).copied().unwrap_or(true)
    }

    pub fn is_required(&self, field_id: &str) -> bool {
        self.required.get(field_id).copied().unwrap_or(false)
    }
}

/// Schema-declared required flags, independent of any rule.
pub fn base_required(sections: &[Section]) -> RequiredMap {
    flatten_fields(sections)
        .map(|field| (field.id.clone(), field.is_required()))
        .collect()
}

/// Targets of at least one `show_field` action. These start hidden.
pub fn show_controlled_fields(rules: &[ConditionalRule]) -> BTreeSet<&str> {
    rules
        .iter()
        .flat_map(|rule| rule.actions.iter())
        .filter(|action| action.kind == ActionType::ShowField)
        .map(|action| action.target_field.as_str())
        .collect()
}

/// Derives a fresh [`FieldState`].
///
/// Two phases: every field defaults to visible with its base required flag and
/// every show-controlled target is forced hidden; then rules run in declaration
/// order, each condition evaluated once, actions applied in order so later
/// writes win. `set_required` never reverts to the base flag on a mismatch.
pub fn derive_field_state(
    sections: &[Section],
    config: &FormConfig,
    values: &Values,
    base_required: &RequiredMap,
) -> FieldState {
    let rules = &config.conditional_logic;

    let mut visibility: VisibilityMap = flatten_fields(sections)
        .map(|field| (field.id.clone(), true))
        .collect();
    let mut required = base_required.clone();

    for field_id in show_controlled_fields(rules) {
        visibility.insert(field_id.to_string(), false);
    }

    for rule in rules {
        if !rule.condition.evaluate(values) {
            continue;
        }
        for action in &rule.actions {
            match action.kind {
                ActionType::ShowField => {
                    visibility.insert(action.target_field.clone(), true);
                }
                ActionType::HideField => {
                    visibility.insert(action.target_field.clone(), false);
                }
                ActionType::SetRequired => {
                    let flag = action.value.as_ref().map(literal_truthy).unwrap_or(true);
                    required.insert(action.target_field.clone(), flag);
                }
                ActionType::Unknown(_) => {}
            }
        }
    }

    tracing::trace!(
        rules = rules.len(),
        hidden = visibility.values().filter(|visible| !**visible).count(),
        "derived field state"
    );

    FieldState {
        visibility,
        required,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::rule::{Action, Condition, Operator};
    use serde_json::json;

    #[test]
    fn show_targets_are_collected_once() {
        let condition = Condition {
            trigger_field: "a".into(),
            operator: Operator::Equals,
            value: json!(1),
        };
        let rules = vec![
            ConditionalRule::new(condition.clone(), vec![Action::show("b"), Action::hide("c")]),
            ConditionalRule::new(condition, vec![Action::show("b"), Action::show("d")]),
        ];
        let targets = show_controlled_fields(&rules);
        assert_eq!(targets.into_iter().collect::<Vec<_>>(), vec!["b", "d"]);
    }
}
