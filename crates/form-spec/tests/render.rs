use serde_json::{Value, json};

use form_spec::{
    FormSession, FormVersion,
    render::{RenderStatus, build_render_payload, render_json_ui, render_text},
};

fn fixture(name: &str) -> &'static str {
    match name {
        "intake_form" => include_str!("../tests/fixtures/intake_form.json"),
        _ => panic!("unknown fixture {}", name),
    }
}

fn session() -> FormSession {
    let body: Value = serde_json::from_str(fixture("intake_form")).expect("fixture json");
    FormSession::new(FormVersion::from_response(body).expect("form version"))
}

#[test]
fn render_text_lists_visible_fields_by_section() {
    let session = session();
    let payload = build_render_payload(&session);
    assert_eq!(payload.status, RenderStatus::NeedInput);
    assert_eq!(payload.progress.total, 1);

    let text = render_text(&payload);
    assert!(text.starts_with("Form: Volunteer intake (version 3)"));
    assert!(text.contains("Status: need_input (0/1 required filled)"));
    assert!(text.contains("[Applicant]"));
    assert!(text.contains(" - name (Full name) [required]"));
    assert!(text.contains("options: email=Email, phone=Phone"));
    assert!(!text.contains(" - email (Email)"));
    assert!(text.contains("Hidden fields: 5"));
    assert!(text.ends_with("Action: Send application"));
}

#[test]
fn render_json_ui_exposes_structure() {
    let mut session = session();
    session.set_value("interests", vec!["tech"].into());
    let ui = render_json_ui(&build_render_payload(&session));

    assert_eq!(ui["version_id"], 3);
    assert_eq!(ui["form_title"], "Volunteer intake");
    assert_eq!(ui["submit"]["state"], "idle");
    assert_eq!(ui["submit"]["label"], "Send application");

    let fields = ui["fields"].as_array().expect("fields array");
    assert_eq!(fields.len(), 11);
    let by_id = |id: &str| {
        fields
            .iter()
            .find(|field| field["id"] == id)
            .unwrap_or_else(|| panic!("missing field {id}"))
    };
    assert_eq!(by_id("tech_stack")["visible"], true);
    assert_eq!(by_id("tech_stack")["control"], json!({ "kind": "textarea", "rows": 6 }));
    assert_eq!(by_id("photos")["control"]["multiple"], true);
    assert_eq!(by_id("resume")["control"]["accept"], ".pdf");
    assert_eq!(by_id("newsletter")["current_value"], false);
    assert_eq!(by_id("interests")["current_value"], json!(["tech"]));
    assert_eq!(by_id("email")["visible"], false);
}

#[test]
fn render_reports_errors_and_completion() {
    let mut session = session();
    session.validate();
    let payload = build_render_payload(&session);
    assert_eq!(payload.status, RenderStatus::Error);
    assert!(render_text(&payload).contains("error: This field is required"));

    session.set_value("name", "Ada".into());
    let payload = build_render_payload(&session);
    assert_eq!(payload.status, RenderStatus::Complete);
    assert_eq!(payload.progress.filled, 1);
    assert!(render_text(&payload).contains(" - name (Full name) [required] = Ada"));
}

#[test]
fn render_shows_submission_outcome() {
    let mut session = session();
    session.set_value("name", "Ada".into());
    session.begin_submit().expect("valid form");
    let ui = render_json_ui(&build_render_payload(&session));
    assert_eq!(ui["submit"]["label"], "Submitting...");

    session.finish_submit(Ok(()));
    let payload = build_render_payload(&session);
    assert!(render_text(&payload).ends_with("Submitted: Thanks for applying!"));
    let ui = render_json_ui(&payload);
    assert_eq!(ui["submit"]["state"], "success");
    assert_eq!(ui["submit"]["message"], "Thanks for applying!");
}
