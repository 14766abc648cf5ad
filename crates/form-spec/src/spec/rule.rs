use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Comparison applied by a rule condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    /// Evaluates to false.
    Unknown(String),
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
            Operator::Contains => "contains",
            Operator::Unknown(label) => label,
        }
    }
}

impl From<String> for Operator {
    fn from(label: String) -> Self {
        match label.as_str() {
            "equals" => Operator::Equals,
            "not_equals" => Operator::NotEquals,
            "greater_than" => Operator::GreaterThan,
            "less_than" => Operator::LessThan,
            "contains" => Operator::Contains,
            _ => Operator::Unknown(label),
        }
    }
}

impl From<Operator> for String {
    fn from(operator: Operator) -> Self {
        operator.as_str().to_string()
    }
}

/// What an action does to its target when the rule matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionType {
    ShowField,
    HideField,
    SetRequired,
    /// Ignored during derivation.
    Unknown(String),
}

impl ActionType {
    pub fn as_str(&self) -> &str {
        match self {
            ActionType::ShowField => "show_field",
            ActionType::HideField => "hide_field",
            ActionType::SetRequired => "set_required",
            ActionType::Unknown(label) => label,
        }
    }
}

impl From<String> for ActionType {
    fn from(label: String) -> Self {
        match label.as_str() {
            "show_field" => ActionType::ShowField,
            "hide_field" => ActionType::HideField,
            "set_required" => ActionType::SetRequired,
            _ => ActionType::Unknown(label),
        }
    }
}

impl From<ActionType> for String {
    fn from(action: ActionType) -> Self {
        action.as_str().to_string()
    }
}

/// A single trigger-field/operator/value test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Condition {
    pub trigger_field: String,
    #[schemars(with = "String")]
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Action {
    #[serde(rename = "type")]
    #[schemars(with = "String")]
    pub kind: ActionType,
    pub target_field: String,
    /// `None` when the key is absent; an explicit JSON `null` is `Some(Null)`.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,
}

impl Action {
    pub fn show(target: impl Into<String>) -> Self {
        Self {
            kind: ActionType::ShowField,
            target_field: target.into(),
            value: None,
        }
    }

    pub fn hide(target: impl Into<String>) -> Self {
        Self {
            kind: ActionType::HideField,
            target_field: target.into(),
            value: None,
        }
    }

    pub fn set_required(target: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            kind: ActionType::SetRequired,
            target_field: target.into(),
            value,
        }
    }
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// One condition plus the actions applied together when it matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConditionalRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "conditions", alias = "condition")]
    pub condition: Condition,
    #[serde(default, deserialize_with = "crate::spec::null_as_default")]
    pub actions: Vec<Action>,
}

impl ConditionalRule {
    pub fn new(condition: Condition, actions: Vec<Action>) -> Self {
        Self {
            id: None,
            description: None,
            condition,
            actions,
        }
    }
}
