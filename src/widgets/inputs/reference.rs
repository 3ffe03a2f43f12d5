use crate::core::property_path::PropertyPath;
use crate::core::value::Value;
use crate::inspector::DocumentKind;
use crate::inspector::field::OptionSpec;
use crate::runtime::Instant;
use crate::widgets::base::FieldBase;
use crate::widgets::dialog::ClosePolicy;
use crate::widgets::inputs::autocomplete::AutocompleteEditor;
use crate::widgets::traits::{
    DrawOutput, Drawable, FieldEditor, FieldInput, FieldKind, InteractionResult, RenderContext,
};
use serde::{Deserialize, Serialize};

/// A document another document can point at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceTarget {
    pub id: String,
    pub name: String,
}

impl ReferenceTarget {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

fn target_options(targets: &[ReferenceTarget]) -> Vec<OptionSpec> {
    targets
        .iter()
        .map(|target| OptionSpec::plain(target.id.clone()).with_label(target.name.clone()))
        .collect()
}

/// Picks documents of one kind by name and stores their ids.
#[derive(Clone)]
pub struct ReferenceEditor {
    inner: AutocompleteEditor,
    target: DocumentKind,
}

impl ReferenceEditor {
    pub fn new(
        path: impl Into<PropertyPath>,
        label: impl Into<String>,
        target: DocumentKind,
        targets: &[ReferenceTarget],
    ) -> Self {
        Self {
            inner: AutocompleteEditor::new(path, label, target_options(targets)).with_unknown_marked(true),
            target,
        }
    }

    pub fn with_multiple(mut self, multiple: bool) -> Self {
        self.inner = self.inner.with_multiple(multiple);
        self
    }

    pub fn with_searchable_threshold(mut self, threshold: usize) -> Self {
        self.inner = self.inner.with_searchable_threshold(threshold);
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.reconcile(value);
        self
    }

    pub fn target(&self) -> DocumentKind {
        self.target
    }

    pub fn set_targets(&mut self, targets: &[ReferenceTarget]) {
        self.inner.set_options(target_options(targets));
    }

    /// Ids whose target no longer exists. They keep their value.
    pub fn dangling(&self) -> Vec<String> {
        self.inner
            .chips()
            .into_iter()
            .filter(|chip| chip.unknown)
            .map(|chip| chip.value)
            .collect()
    }

    pub fn autocomplete(&self) -> &AutocompleteEditor {
        &self.inner
    }
}

impl Drawable for ReferenceEditor {
    fn label(&self) -> &str {
        self.inner.label()
    }

    fn draw(&self, ctx: &RenderContext) -> DrawOutput {
        self.inner.draw(ctx)
    }
}

impl FieldEditor for ReferenceEditor {
    fn base(&self) -> &FieldBase {
        self.inner.base()
    }

    fn base_mut(&mut self) -> &mut FieldBase {
        self.inner.base_mut()
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Reference
    }

    fn on_input(&mut self, input: FieldInput, now: Instant) -> InteractionResult {
        self.inner.on_input(input, now)
    }

    fn value(&self) -> Value {
        self.inner.value()
    }

    fn reset_draft(&mut self) {
        self.inner.reset_draft();
    }

    fn dialog_policy(&self) -> Option<ClosePolicy> {
        Some(ClosePolicy::ExplicitSave)
    }

    fn fork(&self) -> Box<dyn FieldEditor> {
        Box::new(Self {
            inner: self.inner.forked(),
            target: self.target,
        })
    }
}
