use crate::core::error::EngineError;
use crate::inspector::DocumentKind;
use crate::inspector::schema::SchemaInspector;

const ACCOUNT: &str = r#"
kind: account
name_property: display_name
properties:
  - path: display_name
    label: Display name
    required: true
    field: { type: text, trim: true, max_chars: 50 }
  - path: username
    label: Username
    required: true
    pattern: "^[a-z0-9_]{3,24}$"
    pattern_message: Usernames are 3-24 lowercase letters, digits or underscores
    field: { type: text, casing: lower, trim: true, max_chars: 24 }
  - path: bio
    label: Bio
    order: 2
    field: { type: text, multiline: true, max_chars: 300 }
  - path: avatar
    label: Avatar
    order: 1
    field: { type: file, accept: ["*.png", "*.jpg", "*.jpeg", "*.webp"], max_bytes: 2097152 }
  - path: notifications/email
    label: Email notifications
    default: true
    field: { type: boolean }
  - path: notifications/digest
    label: Digest frequency
    default: weekly
    visible_when: { path: notifications/email, equals: true }
    field:
      type: tags
      options:
        - { value: daily, label: Daily }
        - { value: weekly, label: Weekly }
        - { value: monthly, label: Monthly }
"#;

const PROJECT: &str = r#"
kind: project
name_property: title
fallback_name: Untitled project
properties:
  - path: title
    label: Title
    required: true
    field: { type: text, trim: true, max_chars: 80 }
  - path: summary
    label: Summary
    field: { type: text, multiline: true, max_chars: 500 }
  - path: cover
    label: Cover image
    field: { type: file, accept: ["*.png", "*.jpg", "*.jpeg", "*.gif"] }
  - path: tags
    label: Tags
    default: []
    field:
      type: tags
      multiple: true
      free_solo: true
      options:
        - { value: genre/action, label: genre/action }
        - { value: genre/puzzle, label: genre/puzzle }
        - { value: genre/story, label: genre/story }
        - { value: platform/web, label: platform/web }
        - { value: platform/mobile, label: platform/mobile }
  - path: public
    label: Public
    default: false
    field: { type: boolean }
  - path: pitch/audience
    label: Audience
    visible_when: { path: public, equals: true }
    field: { type: text, max_chars: 120 }
  - path: pitch/budget
    label: Budget
    visible_when: { path: public, equals: true }
    default: 0
    field: { type: number, min: 0, max: 1000000, step: 500, force: true }
  - path: players/min
    label: Minimum players
    order: 1
    default: 1
    field: { type: number, min: 1, max: 64, step: 1, force: true }
  - path: players/max
    label: Maximum players
    order: 1
    default: 4
    field: { type: number, min: 1, max: 64, step: 1, force: true }
"#;

const FILE: &str = r#"
kind: file
name_property: name
fallback_name: Untitled file
properties:
  - path: name
    label: Name
    required: true
    pattern: "^[^/\\\\]+$"
    pattern_message: File names cannot contain slashes
    unique_in_batch: true
    field: { type: text, trim: true, max_chars: 120 }
  - path: description
    label: Description
    field: { type: text, multiline: true }
  - path: labels
    label: Labels
    default: [asset]
    field: { type: tags, multiple: true, free_solo: true, fixed: [asset] }
  - path: hidden
    label: Visible to collaborators
    default: false
    field: { type: boolean, inverted: true }
"#;

const MEMBER: &str = r#"
kind: member
name_property: handle
fallback_name: New member
properties:
  - path: handle
    label: Handle
    required: true
    unique_in_batch: true
    field: { type: text, casing: lower, trim: true, max_chars: 32, min_chars: 3 }
  - path: role
    label: Role
    required: true
    default: viewer
    field:
      type: tags
      options:
        - { value: owner, label: Owner }
        - { value: editor, label: Editor }
        - { value: viewer, label: Viewer }
        - { value: "@invite", label: Invite someone new…, action: true }
  - path: project
    label: Project
    field: { type: reference, target: project }
"#;

const REPORT: &str = r#"
kind: report
name_property: reason
fallback_name: Report
properties:
  - path: reason
    label: Reason
    required: true
    field:
      type: tags
      options:
        - { value: spam, label: Spam }
        - { value: abuse, label: Abuse }
        - { value: copyright, label: Copyright }
        - { value: other, label: Other }
  - path: details
    label: Details
    required: true
    field: { type: text, multiline: true, trim: true, max_chars: 2000 }
  - path: severity
    label: Severity
    default: 1
    field: { type: number, min: 1, max: 5, marks: [1, 3, 5], force: true }
  - path: target
    label: Reported project
    field: { type: reference, target: project }
"#;

pub fn schema_source(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Account => ACCOUNT,
        DocumentKind::Project => PROJECT,
        DocumentKind::File => FILE,
        DocumentKind::Member => MEMBER,
        DocumentKind::Report => REPORT,
    }
}

pub fn schema_inspector(kind: DocumentKind) -> Result<SchemaInspector, EngineError> {
    let inspector = SchemaInspector::from_yaml_str(schema_source(kind))?;
    if inspector.kind() != kind {
        return Err(EngineError::InvalidSchema {
            kind: kind.to_string(),
            reason: format!("schema declares kind '{}'", inspector.kind()),
        });
    }
    Ok(inspector)
}
