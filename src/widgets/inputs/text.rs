use crate::core::property_path::PropertyPath;
use crate::core::value::Value;
use crate::inspector::field::TextSpec;
use crate::runtime::Instant;
use crate::runtime::event::FieldAction;
use crate::ui::span::Span;
use crate::widgets::base::FieldBase;
use crate::widgets::dialog::ClosePolicy;
use crate::widgets::traits::{
    DrawOutput, Drawable, FieldEditor, FieldInput, FieldKind, InteractionResult, RenderContext,
};
use crate::widgets::validators::Validator;
use tracing::trace;

const LABEL_COLUMN: usize = 18;

#[derive(Clone)]
pub struct TextEditor {
    base: FieldBase,
    draft: String,
    max_chars: Option<usize>,
    multiline: bool,
    placeholder: Option<String>,
    /// Ceiling was hit by the last keystroke.
    shake: bool,
}

impl TextEditor {
    pub fn new(path: impl Into<PropertyPath>, label: impl Into<String>) -> Self {
        Self {
            base: FieldBase::new(path, label),
            draft: String::new(),
            max_chars: None,
            multiline: false,
            placeholder: None,
            shake: false,
        }
    }

    pub fn from_spec(path: impl Into<PropertyPath>, label: impl Into<String>, spec: &TextSpec) -> Self {
        let mut editor = Self::new(path, label).with_multiline(spec.multiline);
        editor.max_chars = spec.rules.max_chars;
        editor.placeholder = spec.placeholder.clone();
        editor
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = Some(max_chars);
        self
    }

    pub fn with_multiline(mut self, multiline: bool) -> Self {
        self.multiline = multiline;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.base.add_validator(validator);
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.reconcile(value);
        self
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_shaking(&self) -> bool {
        self.shake
    }

    fn on_text(&mut self, text: String, now: Instant) -> InteractionResult {
        let mut result = InteractionResult::handled();
        let accepted = match self.max_chars {
            Some(limit) if text.chars().count() > limit => {
                self.shake = true;
                result.push(FieldAction::LimitReached);
                text.chars().take(limit).collect()
            }
            _ => {
                self.shake = false;
                text
            }
        };

        if accepted == self.draft {
            return result;
        }
        trace!(path = %self.base.path(), chars = accepted.chars().count(), "text input");
        self.draft = accepted;
        let value = self.value();
        result.push(FieldAction::InputChanged(value.clone()));
        result.push(FieldAction::Changed(value.clone()));
        self.base.schedule_debounce(value, now);
        result
    }

    fn on_blur(&mut self) -> InteractionResult {
        self.base.set_focused(false);
        self.shake = false;
        self.base.cancel_debounce();
        let value = self.value();
        self.refresh_error(crate::widgets::traits::ValidationMode::Live);
        InteractionResult::with_actions(vec![
            FieldAction::Changed(value.clone()),
            FieldAction::DebouncedChanged(value),
            FieldAction::Blurred,
        ])
    }
}

impl Drawable for TextEditor {
    fn label(&self) -> &str {
        self.base.label()
    }

    fn draw(&self, ctx: &RenderContext) -> DrawOutput {
        let theme = &ctx.theme;
        let mut first = vec![self.base.label_span(ctx), self.base.label_padding(LABEL_COLUMN)];
        let mut rest = Vec::new();

        if self.draft.is_empty() {
            let placeholder = self.placeholder.clone().unwrap_or_default();
            first.push(Span::styled(placeholder, theme.placeholder).no_wrap());
        } else if self.multiline {
            let mut lines = self.draft.lines();
            first.push(Span::styled(lines.next().unwrap_or_default(), theme.value));
            for line in lines {
                rest.push(vec![
                    Span::new(" ".repeat(LABEL_COLUMN)).no_wrap(),
                    Span::styled(line, theme.value),
                ]);
            }
        } else {
            first.push(Span::styled(self.draft.clone(), theme.value).no_wrap());
        }

        if let Some(limit) = self.max_chars {
            let style = if self.shake { theme.error } else { theme.hint };
            first.push(
                Span::styled(format!("  {}/{}", self.draft.chars().count(), limit), style).no_wrap(),
            );
        }
        if let Some(error) = self.base.error_span(theme) {
            first.push(error);
        }

        let mut lines = vec![first];
        lines.extend(rest);
        DrawOutput { lines }
    }
}

impl FieldEditor for TextEditor {
    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FieldBase {
        &mut self.base
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Text
    }

    fn on_input(&mut self, input: FieldInput, now: Instant) -> InteractionResult {
        match input {
            FieldInput::Focus => {
                self.base.set_focused(true);
                InteractionResult::handled()
            }
            FieldInput::Blur => self.on_blur(),
            FieldInput::Text(text) => self.on_text(text, now),
            FieldInput::Submit if !self.multiline => self.on_blur(),
            FieldInput::Submit => self.on_text(format!("{}\n", self.draft), now),
            _ => InteractionResult::ignored(),
        }
    }

    fn value(&self) -> Value {
        Value::Text(self.draft.clone())
    }

    fn reset_draft(&mut self) {
        self.draft = self.base.committed().to_text_scalar().unwrap_or_default();
        self.shake = false;
    }

    fn dialog_policy(&self) -> Option<ClosePolicy> {
        Some(ClosePolicy::ExplicitSave)
    }

    fn fork(&self) -> Box<dyn FieldEditor> {
        let mut fork = self.clone();
        fork.base = self.base.forked();
        fork.reset_draft();
        Box::new(fork)
    }
}
