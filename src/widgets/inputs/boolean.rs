use crate::core::property_path::PropertyPath;
use crate::core::value::Value;
use crate::runtime::Instant;
use crate::runtime::event::FieldAction;
use crate::ui::span::Span;
use crate::widgets::base::FieldBase;
use crate::widgets::traits::{
    DrawOutput, Drawable, FieldEditor, FieldInput, FieldKind, InteractionResult, RenderContext,
};

const LABEL_COLUMN: usize = 18;

/// Switch over a boolean property. With `inverted` the switch shows "on"
/// when the stored value is `false`.
#[derive(Clone)]
pub struct BooleanEditor {
    base: FieldBase,
    checked: bool,
    inverted: bool,
}

impl BooleanEditor {
    pub fn new(path: impl Into<PropertyPath>, label: impl Into<String>) -> Self {
        Self {
            base: FieldBase::new(path, label),
            checked: false,
            inverted: false,
        }
    }

    pub fn inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.reconcile(value);
        self
    }

    /// Visual state of the switch.
    pub fn is_on(&self) -> bool {
        self.checked != self.inverted
    }

    fn set_on(&mut self, on: bool, now: Instant) -> InteractionResult {
        let checked = on != self.inverted;
        if checked == self.checked {
            return InteractionResult::ignored();
        }
        self.checked = checked;
        let value = self.value();
        self.base.schedule_debounce(value.clone(), now);
        InteractionResult::with_actions(vec![
            FieldAction::InputChanged(value.clone()),
            FieldAction::Changed(value),
        ])
    }
}

impl Drawable for BooleanEditor {
    fn label(&self) -> &str {
        self.base.label()
    }

    fn draw(&self, ctx: &RenderContext) -> DrawOutput {
        let theme = &ctx.theme;
        let (symbol, style) = if self.is_on() {
            ("[✓]", theme.accent)
        } else {
            ("[ ]", theme.hint)
        };
        let mut spans = vec![
            self.base.label_span(ctx),
            self.base.label_padding(LABEL_COLUMN),
            Span::styled(symbol, style).no_wrap(),
        ];
        if let Some(error) = self.base.error_span(theme) {
            spans.push(error);
        }
        DrawOutput::single(spans)
    }
}

impl FieldEditor for BooleanEditor {
    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FieldBase {
        &mut self.base
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Boolean
    }

    fn on_input(&mut self, input: FieldInput, now: Instant) -> InteractionResult {
        match input {
            FieldInput::Focus => {
                self.base.set_focused(true);
                InteractionResult::handled()
            }
            FieldInput::Blur => {
                self.base.set_focused(false);
                InteractionResult::with_action(FieldAction::Blurred)
            }
            FieldInput::Toggle | FieldInput::Submit => {
                let on = !self.is_on();
                self.set_on(on, now)
            }
            FieldInput::SetChecked(on) => self.set_on(on, now),
            _ => InteractionResult::ignored(),
        }
    }

    fn value(&self) -> Value {
        Value::Bool(self.checked)
    }

    fn reset_draft(&mut self) {
        self.checked = self.base.committed().to_bool().unwrap_or(false);
    }

    fn fork(&self) -> Box<dyn FieldEditor> {
        let mut fork = self.clone();
        fork.base = self.base.forked();
        fork.reset_draft();
        Box::new(fork)
    }
}
