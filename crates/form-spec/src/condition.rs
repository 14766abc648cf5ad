use crate::spec::rule::{Condition, Operator};
use crate::value::{FieldValue, Values, literal_to_number};

impl Condition {
    /// Tests the condition against the current values. Never fails: unknown
    /// operators and incomparable values evaluate to `false`.
    pub fn evaluate(&self, values: &Values) -> bool {
        let left = values.get(&self.trigger_field);
        match &self.operator {
            Operator::Equals => equals(left, &self.value),
            Operator::NotEquals => !equals(left, &self.value),
            Operator::GreaterThan => to_number(left) > literal_to_number(&self.value),
            Operator::LessThan => to_number(left) < literal_to_number(&self.value),
            Operator::Contains => match left {
                Some(FieldValue::List(items)) => {
                    items.iter().any(|item| item.equals_literal(&self.value))
                }
                _ => false,
            },
            Operator::Unknown(_) => false,
        }
    }
}

/// A missing value is treated as `null`.
fn equals(left: Option<&FieldValue>, right: &serde_json::Value) -> bool {
    left.unwrap_or(&FieldValue::Null).equals_literal(right)
}

/// A missing value has no numeric reading, unlike `null` which reads as zero.
fn to_number(left: Option<&FieldValue>) -> f64 {
    left.map(FieldValue::to_number).unwrap_or(f64::NAN)
}
