pub mod autocomplete;
pub mod boolean;
pub mod file;
pub mod number;
pub mod reference;
pub mod text;

use crate::config::EngineConfig;
use crate::core::error::ConfigError;
use crate::core::property_path::PropertyPath;
use crate::inspector::field::FieldSpec;
use crate::widgets::traits::FieldEditor;
use crate::widgets::validators::field_validators;

pub use autocomplete::{AutocompleteEditor, Chip, GroupFn, OptionGroup};
pub use boolean::BooleanEditor;
pub use file::{FileEditor, FilePreview, PreDeleteHook};
pub use number::NumberEditor;
pub use reference::{ReferenceEditor, ReferenceTarget};
pub use text::TextEditor;

/// Instantiates the editor a field spec asks for.
pub fn build_editor(
    path: PropertyPath,
    label: String,
    spec: &FieldSpec,
    config: &EngineConfig,
    targets: &[ReferenceTarget],
    pre_delete: Option<PreDeleteHook>,
) -> Result<Box<dyn FieldEditor>, ConfigError> {
    let mut editor: Box<dyn FieldEditor> = match spec {
        FieldSpec::Text(text) => Box::new(TextEditor::from_spec(path, label, text)),
        FieldSpec::Number(bounds) => Box::new(NumberEditor::new(path, label, bounds.clone())),
        FieldSpec::Boolean { inverted } => Box::new(BooleanEditor::new(path, label).inverted(*inverted)),
        FieldSpec::File(file) => {
            let editor = FileEditor::from_spec(path, label, file, config.max_upload_bytes)?;
            match pre_delete {
                Some(hook) => Box::new(editor.with_pre_delete(hook)),
                None => Box::new(editor),
            }
        }
        FieldSpec::Tags(tags) => Box::new(
            AutocompleteEditor::from_spec(path, label, tags)
                .with_searchable_threshold(config.searchable_threshold),
        ),
        FieldSpec::Reference { target, multiple } => Box::new(
            ReferenceEditor::new(path, label, *target, targets)
                .with_multiple(*multiple)
                .with_searchable_threshold(config.searchable_threshold),
        ),
    };
    editor.base_mut().set_debounce(config.debounce());
    for validator in field_validators(spec) {
        editor.base_mut().add_validator(validator);
    }
    Ok(editor)
}
