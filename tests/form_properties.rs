use propedit::runtime::request::{FileReference, LocalFile};
use propedit::{
    Document, EngineConfig, FieldEditor, FieldInput, FormContext, FormEvent, FormOptions, Inspector, InspectorRegistry,
    NoticeLevel, NoticeQueue, PropertyForm, PropertyPath, ResourceError, SchemaInspector, Ticket, Value,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

fn project(title: &str) -> Document {
    Document::new().with("kind", "project").with("title", title)
}

fn report() -> Document {
    Document::new()
        .with("kind", "report")
        .with("reason", "spam")
        .with("details", "Copies another project")
}

fn registry() -> InspectorRegistry {
    InspectorRegistry::builtin().expect("builtin registry")
}

fn mount(documents: Vec<Document>) -> PropertyForm {
    mount_with(documents, FormOptions::default())
}

fn mount_with(documents: Vec<Document>, options: FormOptions) -> PropertyForm {
    PropertyForm::mount(documents, registry(), options, FormContext::default()).expect("mount")
}

fn path(raw: &str) -> PropertyPath {
    PropertyPath::from(raw)
}

fn changed(raw: &str, value: impl Into<Value>) -> FormEvent {
    FormEvent::Changed {
        path: path(raw),
        value: value.into(),
    }
}

fn validation_ticket(events: &[FormEvent]) -> Ticket {
    events
        .iter()
        .find_map(|event| match event {
            FormEvent::ValidationRequested(request) => Some(request.ticket),
            _ => None,
        })
        .expect("validation requested")
}

#[test]
fn keystroke_burst_settles_once_with_the_last_value() {
    let t0 = Instant::now();
    let title = path("title");
    let mut form = mount(vec![project("")]);

    for (offset, text) in [(0, "a"), (100, "ab"), (200, "abc")] {
        let events = form
            .handle(&title, FieldInput::Text(text.to_string()), t0 + Duration::from_millis(offset))
            .expect("typed");
        assert!(events.contains(&changed("title", text)));
    }
    assert_eq!(
        form.poll_timeout(t0 + Duration::from_millis(200), Duration::from_secs(5)),
        Duration::from_millis(500)
    );
    assert!(form.tick(t0 + Duration::from_millis(650)).expect("tick").is_empty());

    let settled: Vec<FormEvent> = form
        .tick(t0 + Duration::from_millis(700))
        .expect("tick")
        .into_iter()
        .filter(|event| matches!(event, FormEvent::DebouncedChanged { .. }))
        .collect();
    assert_eq!(
        settled,
        vec![FormEvent::DebouncedChanged {
            path: title,
            value: Value::from("abc"),
        }]
    );
    assert!(form.tick(t0 + Duration::from_secs(2)).expect("tick").is_empty());
}

#[test]
fn toggled_boolean_still_settles() {
    let t0 = Instant::now();
    let public = path("public");
    let mut form = mount(vec![project("Orbit")]);

    let events = form.handle(&public, FieldInput::Toggle, t0).expect("toggled");
    assert!(events.contains(&changed("public", true)));
    assert!(!events.iter().any(|event| matches!(event, FormEvent::DebouncedChanged { .. })));

    let settled = form.tick(t0 + Duration::from_millis(600)).expect("tick");
    assert!(settled.contains(&FormEvent::DebouncedChanged {
        path: public,
        value: Value::Bool(true),
    }));
}

#[test]
fn commit_applies_uniformly_across_the_batch() {
    let max = path("players/max");
    let mut form = mount(vec![project("A"), project("B"), project("C")]);
    form.toggle_group(&path("players/")).expect("expand");

    let events = form
        .handle(&max, FieldInput::Text("99".to_string()), Instant::now())
        .expect("typed");
    assert!(events.contains(&changed("players/max", 64.0)));
    assert!(
        form.documents()
            .iter()
            .all(|document| document.get(&max) == Some(&Value::Number(64.0)))
    );
    assert_eq!(form.session().changed_paths(), vec![max]);
}

#[test]
fn one_invalid_document_blocks_submission_for_the_batch() {
    let mut form = mount(vec![project("Orbit"), project("")]);
    let events = form.submit();

    let Some(FormEvent::SubmitBlocked { errors }) = events.last() else {
        panic!("expected a blocked submit, got {events:?}");
    };
    assert_eq!(errors.get(&path("title")).map(String::as_str), Some("Title is required"));
    assert!(!events.iter().any(|event| matches!(event, FormEvent::Submitted { .. })));
    assert!(!form.is_submitting());
}

#[test]
fn valid_batch_submits_once_until_finished() {
    let mut form = mount(vec![project("Orbit"), project("Tidepool")]);
    let events = form.submit();
    let Some(FormEvent::Submitted { documents }) = events.last() else {
        panic!("expected a submit, got {events:?}");
    };
    assert_eq!(documents.len(), 2);

    assert!(form.submit().is_empty());
    form.finish_submit();
    assert!(matches!(form.submit().last(), Some(FormEvent::Submitted { .. })));
}

fn member(handle: &str) -> Document {
    Document::new().with("kind", "member").with("handle", handle)
}

#[test]
fn field_rules_block_submission_on_any_batch_document() {
    let mut form = mount(vec![member("abcd"), member("ab")]);
    let events = form.submit();

    let Some(FormEvent::SubmitBlocked { errors }) = events.last() else {
        panic!("expected a blocked submit, got {events:?}");
    };
    assert_eq!(
        errors.get(&path("handle")).map(String::as_str),
        Some("Use at least 3 characters")
    );
    assert!(!events.iter().any(|event| matches!(event, FormEvent::Submitted { .. })));
}

const COLLAPSED_RULE: &str = r#"
kind: project
properties:
  - path: title
    field: { type: text }
  - path: meta/code
    default: x
    field: { type: text, min_chars: 3 }
"#;

#[test]
fn field_rules_inside_collapsed_groups_block_submission() {
    let inspector: Arc<dyn Inspector> = Arc::new(SchemaInspector::from_yaml_str(COLLAPSED_RULE).expect("schema"));
    let mut form = PropertyForm::mount(vec![project("Orbit")], inspector, FormOptions::default(), FormContext::default())
        .expect("mount");
    let code = path("meta/code");
    assert!(form.editor(&code).is_none());

    let events = form.submit();
    let Some(FormEvent::SubmitBlocked { errors }) = events.last() else {
        panic!("expected a blocked submit, got {events:?}");
    };
    assert_eq!(errors.get(&code).map(String::as_str), Some("Use at least 3 characters"));
}

#[test]
fn typed_value_is_normalized_before_commit() {
    let mut form = mount(vec![report()]);
    let events = form
        .handle(&path("severity"), FieldInput::Text("7".to_string()), Instant::now())
        .expect("typed");
    assert!(events.contains(&changed("severity", 5.0)));
    assert_eq!(form.session().value(&path("severity")), Value::Number(5.0));
}

const STEPPED_MARKS: &str = r#"
kind: report
properties:
  - path: score
    default: 0
    field: { type: number, min: 0, max: 10, step: 5, marks: [3, 8], force: true }
"#;

#[test]
fn typed_number_snaps_to_step_before_mark() {
    let inspector: Arc<dyn Inspector> = Arc::new(SchemaInspector::from_yaml_str(STEPPED_MARKS).expect("schema"));
    let document = Document::new().with("kind", "report");
    let mut form =
        PropertyForm::mount(vec![document], inspector, FormOptions::default(), FormContext::default()).expect("mount");

    let events = form
        .handle(&path("score"), FieldInput::Text("7.4".to_string()), Instant::now())
        .expect("typed");
    assert!(events.contains(&changed("score", 3.0)));
}

#[test]
fn dialog_round_trip_without_edits_changes_nothing() {
    let title = path("title");
    let mut form = mount(vec![project("Orbit")]);

    let opened = form.activate(&title, 400, Instant::now()).expect("activate");
    assert_eq!(opened, vec![FormEvent::DialogOpened { path: title.clone() }]);
    form.dialog_entered();

    let closed = form.dialog_close().expect("close");
    assert_eq!(
        closed,
        vec![FormEvent::DialogClosed {
            path: title.clone(),
            saved: false,
        }]
    );
    form.dialog_finished();
    assert!(form.dialog().is_none());
    assert_eq!(form.session().value(&title), Value::from("Orbit"));
    assert!(!form.session().is_dirty());
}

#[test]
fn wide_viewport_focuses_inline() {
    let title = path("title");
    let mut form = mount(vec![project("Orbit")]);
    assert!(form.activate(&title, 1024, Instant::now()).expect("activate").is_empty());
    assert!(form.dialog().is_none());
    assert!(form.editor(&title).expect("editor").base().is_focused());
}

#[test]
fn discarding_a_dialog_draft_restores_the_baseline() {
    let title = path("title");
    let mut form = mount(vec![project("Orbit")]);
    form.activate(&title, 400, Instant::now()).expect("activate");
    form.dialog_entered();

    let typed = form
        .dialog_input(FieldInput::Text("Nebula".to_string()), Instant::now())
        .expect("typed");
    assert!(typed.is_empty());
    assert!(form.dialog_close().expect("close").is_empty());
    let dialog = form.dialog().expect("still open");
    assert!(dialog.is_confirming_discard());
    assert!(form.draw(60).to_plain_text().contains("+ Nebula"));

    let closed = form.dialog_confirm_discard().expect("discard");
    assert_eq!(
        closed,
        vec![FormEvent::DialogClosed {
            path: title.clone(),
            saved: false,
        }]
    );
    assert_eq!(form.session().value(&title), Value::from("Orbit"));
    assert_eq!(form.editor(&title).expect("editor").value(), Value::from("Orbit"));
}

#[test]
fn saving_a_dialog_commits_through_every_tier() {
    let title = path("title");
    let mut form = mount(vec![project("Orbit")]);
    form.activate(&title, 400, Instant::now()).expect("activate");
    form.dialog_entered();
    form.dialog_input(FieldInput::Text("Nebula".to_string()), Instant::now())
        .expect("typed");

    let events = form.dialog_save().expect("save");
    assert_eq!(
        events,
        vec![
            FormEvent::InputChanged {
                path: title.clone(),
                value: Value::from("Nebula"),
            },
            changed("title", "Nebula"),
            FormEvent::DebouncedChanged {
                path: title.clone(),
                value: Value::from("Nebula"),
            },
            FormEvent::DialogClosed {
                path: title.clone(),
                saved: true,
            },
        ]
    );
    assert_eq!(form.editor(&title).expect("editor").value(), Value::from("Nebula"));
}

#[test]
fn autosave_dialog_commits_while_open() {
    let severity = path("severity");
    let mut form = mount(vec![report()]);
    form.activate(&severity, 320, Instant::now()).expect("activate");
    form.dialog_entered();

    let events = form
        .dialog_input(FieldInput::Text("4".to_string()), Instant::now())
        .expect("typed");
    assert!(events.contains(&changed("severity", 3.0)));
    assert_eq!(form.session().value(&severity), Value::Number(3.0));

    let closed = form.dialog_close().expect("close");
    assert_eq!(
        closed,
        vec![
            FormEvent::DebouncedChanged {
                path: severity.clone(),
                value: Value::Number(3.0),
            },
            FormEvent::DialogClosed {
                path: severity,
                saved: false,
            },
        ]
    );
}

const NESTED: &str = r#"
kind: account
properties:
  - path: name
    field: { type: text }
  - path: stats/max
    default: 3
    field: { type: number }
  - path: stats/limits/hard
    default: 9
    field: { type: number }
"#;

#[test]
fn nested_groups_recurse_and_restore_paths() {
    let inspector: Arc<dyn Inspector> = Arc::new(SchemaInspector::from_yaml_str(NESTED).expect("schema"));
    let document = Document::new().with("kind", "account").with("name", "ops");
    let mut form =
        PropertyForm::mount(vec![document], inspector, FormOptions::default(), FormContext::default()).expect("mount");

    let hard = path("stats/limits/hard");
    assert!(form.handle(&hard, FieldInput::Text("12".to_string()), Instant::now()).is_err());

    form.toggle_group(&path("stats/")).expect("outer");
    assert!(form.editor(&path("stats/max")).is_some());
    assert!(form.editor(&hard).is_none());
    form.toggle_group(&path("stats/limits/")).expect("inner");

    let events = form
        .handle(&hard, FieldInput::Text("12".to_string()), Instant::now())
        .expect("typed");
    assert!(events.contains(&changed("stats/limits/hard", 12.0)));
    assert_eq!(form.session().value(&hard), Value::Number(12.0));
    assert_eq!(form.session().value(&path("stats/max")), Value::Number(3.0));
}

#[test]
fn expand_groups_config_opens_every_level() {
    let options = FormOptions::default().with_config(EngineConfig {
        expand_groups: true,
        ..EngineConfig::default()
    });
    let form = mount_with(vec![project("Orbit")], options);
    assert_eq!(
        form.editor(&path("players/min")).expect("built").value(),
        Value::Number(1.0)
    );
}

fn cover_file() -> LocalFile {
    LocalFile {
        name: "cover.png".to_string(),
        size: 2048,
        mime: Some("image/png".to_string()),
        blob_url: "blob:cover".to_string(),
    }
}

fn upload_ticket(events: &[FormEvent]) -> Ticket {
    match events {
        [FormEvent::UploadRequested(request)] => request.ticket,
        other => panic!("expected one upload request, got {other:?}"),
    }
}

#[test]
fn failed_upload_rolls_back_and_notifies() {
    let cover = path("cover");
    let notices = Arc::new(NoticeQueue::new());
    let context = FormContext::new(notices.clone(), Default::default());
    let mut form =
        PropertyForm::mount(vec![project("Orbit")], registry(), FormOptions::default(), context).expect("mount");

    let requested = form
        .handle(&cover, FieldInput::PickFile(cover_file()), Instant::now())
        .expect("picked");
    let ticket = upload_ticket(&requested);
    assert!(form.editor(&cover).expect("editor").base().is_busy());

    let events = form
        .resolve_upload(&cover, ticket, Err(ResourceError::new("storage offline")))
        .expect("resolved");
    assert!(events.is_empty());
    assert_eq!(form.session().value(&cover), Value::None);
    assert!(!form.editor(&cover).expect("editor").base().is_busy());

    let notices = notices.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert!(notices[0].message.contains("storage offline"));
}

#[test]
fn successful_upload_commits_the_reference() {
    let cover = path("cover");
    let mut form = mount(vec![project("Orbit")]);
    let ticket = upload_ticket(
        &form
            .handle(&cover, FieldInput::PickFile(cover_file()), Instant::now())
            .expect("picked"),
    );
    let stored = FileReference {
        storage_key: "covers/1.png".to_string(),
        url: "https://cdn.example/covers/1.png".to_string(),
        name: "cover.png".to_string(),
        size: 2048,
    };
    let events = form.resolve_upload(&cover, ticket, Ok(stored.clone())).expect("resolved");
    assert!(events.contains(&changed("cover", stored.to_value())));
    assert_eq!(FileReference::from_value(&form.session().value(&cover)), Some(stored));
}

#[test]
fn pre_delete_hook_runs_before_the_delete_request() {
    let cover = path("cover");
    let stored = FileReference {
        storage_key: "covers/1.png".to_string(),
        url: "https://cdn.example/covers/1.png".to_string(),
        name: "cover.png".to_string(),
        size: 2048,
    };
    let cleaned = Arc::new(Mutex::new(Vec::new()));
    let seen = cleaned.clone();
    let options = FormOptions::default().with_pre_delete(
        "cover",
        Arc::new(move |reference: &FileReference| {
            seen.lock().expect("lock").push(reference.storage_key.clone());
        }),
    );
    let mut form = mount_with(vec![project("Orbit").with("cover", stored.to_value())], options);

    let events = form.handle(&cover, FieldInput::DeleteFile, Instant::now()).expect("deleted");
    assert_eq!(*cleaned.lock().expect("lock"), vec!["covers/1.png".to_string()]);
    assert!(matches!(
        events.as_slice(),
        [FormEvent::DeleteRequested(request)] if request.path == cover && request.storage_key == "covers/1.png"
    ));
}

#[test]
fn upload_result_from_a_previous_mount_is_dropped() {
    let cover = path("cover");
    let mut form = mount(vec![project("Orbit")]);
    let ticket = upload_ticket(
        &form
            .handle(&cover, FieldInput::PickFile(cover_file()), Instant::now())
            .expect("picked"),
    );
    form.replace_documents(vec![project("Orbit")]).expect("replace");

    let stored = FileReference {
        storage_key: "covers/2.png".to_string(),
        url: "https://cdn.example/covers/2.png".to_string(),
        name: "cover.png".to_string(),
        size: 2048,
    };
    assert!(form.resolve_upload(&cover, ticket, Ok(stored)).expect("resolved").is_empty());
    assert_eq!(form.session().value(&cover), Value::None);
}

fn async_form(documents: Vec<Document>) -> PropertyForm {
    mount_with(documents, FormOptions::default().with_async_validation(true))
}

#[test]
fn settle_tier_requests_one_validation_per_document() {
    let t0 = Instant::now();
    let title = path("title");
    let mut form = async_form(vec![project("A"), project("B")]);
    form.handle(&title, FieldInput::Text("Same".to_string()), t0).expect("typed");

    let events = form.tick(t0 + Duration::from_secs(1)).expect("tick");
    let requests: Vec<usize> = events
        .iter()
        .filter_map(|event| match event {
            FormEvent::ValidationRequested(request) => Some(request.doc_index),
            _ => None,
        })
        .collect();
    assert_eq!(requests, vec![0, 1]);
    let ticket = validation_ticket(&events);

    assert!(form.resolve_validation(ticket, 1, Some("Title already used".to_string())).is_empty());
    let found = form.resolve_validation(ticket, 0, None);
    assert_eq!(
        found,
        vec![FormEvent::PropertyErrorFound {
            path: title.clone(),
            error: "Title already used".to_string(),
        }]
    );
    assert!(matches!(form.submit().last(), Some(FormEvent::SubmitBlocked { .. })));
}

#[test]
fn commit_supersedes_a_pending_validation_round() {
    let t0 = Instant::now();
    let title = path("title");
    let mut form = async_form(vec![project("A")]);
    form.handle(&title, FieldInput::Text("Taken".to_string()), t0).expect("typed");
    let stale = validation_ticket(&form.tick(t0 + Duration::from_secs(1)).expect("tick"));

    form.handle(&title, FieldInput::Text("Free".to_string()), t0 + Duration::from_secs(2))
        .expect("typed");
    assert!(form.resolve_validation(stale, 0, Some("taken".to_string())).is_empty());
    assert_eq!(form.error(&title), None);

    let fresh = validation_ticket(&form.tick(t0 + Duration::from_secs(3)).expect("tick"));
    assert_ne!(fresh, stale);
    assert!(form.resolve_validation(fresh, 0, None).is_empty());
    assert_eq!(form.error(&title), None);
}

#[test]
fn validation_result_from_a_previous_mount_is_dropped() {
    let t0 = Instant::now();
    let title = path("title");
    let mut form = async_form(vec![project("A")]);
    form.handle(&title, FieldInput::Text("Taken".to_string()), t0).expect("typed");
    let ticket = validation_ticket(&form.tick(t0 + Duration::from_secs(1)).expect("tick"));

    form.replace_documents(vec![project("Other")]).expect("replace");
    assert!(form.resolve_validation(ticket, 0, Some("taken".to_string())).is_empty());
    assert_eq!(form.error(&title), None);
    assert_eq!(form.session().value(&title), Value::from("Other"));
}
