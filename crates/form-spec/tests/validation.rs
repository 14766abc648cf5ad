use serde_json::{Value, json};

use form_spec::{
    Action, Condition, ConditionalRule, Field, FieldType, FieldValidation, FormConfig, FormSession,
    FormVersion, Operator, REQUIRED_MESSAGE, Section, Values, base_required, derive_field_state,
    validate,
};

fn fixture(name: &str) -> &'static str {
    match name {
        "intake_form" => include_str!("../tests/fixtures/intake_form.json"),
        _ => panic!("unknown fixture {}", name),
    }
}

fn intake() -> FormVersion {
    let body: Value = serde_json::from_str(fixture("intake_form")).expect("fixture json");
    FormVersion::from_response(body).expect("form version")
}

fn values(entries: Value) -> Values {
    serde_json::from_value(entries).expect("values")
}

fn field(id: &str, required: bool) -> Field {
    Field {
        id: id.into(),
        kind: FieldType::Text,
        label: id.into(),
        grid_width: None,
        placeholder: None,
        options: vec![],
        validations: Some(FieldValidation {
            required,
            ..FieldValidation::default()
        }),
        props: None,
    }
}

#[test]
fn hidden_required_field_is_never_flagged() {
    let sections = vec![Section {
        id: None,
        title: "Main".into(),
        description: None,
        fields: vec![field("toggle", false), field("secret", true)],
    }];
    let config = FormConfig {
        conditional_logic: vec![ConditionalRule::new(
            Condition {
                trigger_field: "toggle".into(),
                operator: Operator::Equals,
                value: json!("on"),
            },
            vec![Action::show("secret")],
        )],
        ..FormConfig::default()
    };
    let base = base_required(&sections);
    let fields = || sections.iter().flat_map(|section| section.fields.iter());

    let snapshot = values(json!({ "toggle": "off", "secret": null }));
    let state = derive_field_state(&sections, &config, &snapshot, &base);
    assert!(validate(fields(), &state, &snapshot).is_empty());

    let snapshot = values(json!({ "toggle": "on", "secret": "" }));
    let state = derive_field_state(&sections, &config, &snapshot, &base);
    let errors = validate(fields(), &state, &snapshot);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors["secret"], REQUIRED_MESSAGE);
}

#[test]
fn fresh_intake_session_only_flags_name() {
    let session = FormSession::new(intake());
    let errors = session.check();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors["name"], REQUIRED_MESSAGE);
}

#[test]
fn rule_driven_requirement_is_enforced() {
    let mut session = FormSession::new(intake());
    session.set_values(values(json!({
        "name": "Ada",
        "contact_method": "phone"
    })));
    let errors = session.check();
    assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["phone"]);

    session.set_value("phone", "555-0100".into());
    assert!(session.check().is_empty());

    // Switching to email hides the phone field and requires email instead.
    session.set_value("contact_method", "email".into());
    let errors = session.check();
    assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["email"]);
}

#[test]
fn whitespace_and_false_count_as_filled() {
    let mut session = FormSession::new(intake());
    session.set_value("name", " ".into());
    assert!(session.check().is_empty());

    let state = session.field_state();
    let snapshot = values(json!({ "name": false }));
    assert!(validate(session.fields(), &state, &snapshot).is_empty());
}

#[test]
fn empty_list_is_missing() {
    let version = intake();
    let mut session = FormSession::new(version);
    session.set_values(values(json!({ "name": [] })));
    assert_eq!(session.check()["name"], REQUIRED_MESSAGE);
}

#[test]
fn validate_stores_errors_and_set_value_clears_them() {
    let mut session = FormSession::new(intake());
    assert!(!session.validate());
    assert_eq!(session.error("name"), Some(REQUIRED_MESSAGE));

    session.set_value("name", "Grace".into());
    assert_eq!(session.error("name"), None);
    assert!(session.validate());
}
