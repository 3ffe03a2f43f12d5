use crate::core::property_path::PropertyPath;
use crate::core::value::{Value, format_number};
use crate::inspector::normalize::NumberBounds;
use crate::runtime::Instant;
use crate::runtime::event::FieldAction;
use crate::ui::span::Span;
use crate::widgets::base::FieldBase;
use crate::widgets::dialog::ClosePolicy;
use crate::widgets::traits::{
    DrawOutput, Drawable, FieldEditor, FieldInput, FieldKind, InteractionResult, RenderContext,
    ValidationMode,
};
use crate::widgets::validators::Validator;
use tracing::trace;

const LABEL_COLUMN: usize = 18;

/// Text box plus slider over the same number.
#[derive(Clone)]
pub struct NumberEditor {
    base: FieldBase,
    bounds: NumberBounds,
    text: String,
    number: Option<f64>,
    dragging: bool,
    track_len: usize,
}

impl NumberEditor {
    pub fn new(path: impl Into<PropertyPath>, label: impl Into<String>, bounds: NumberBounds) -> Self {
        Self {
            base: FieldBase::new(path, label),
            bounds,
            text: String::new(),
            number: None,
            dragging: false,
            track_len: 15,
        }
    }

    pub fn with_track_len(mut self, track_len: usize) -> Self {
        self.track_len = track_len.max(3);
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

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    fn commit(&mut self, number: f64, now: Instant, input: Value) -> InteractionResult {
        let normalized = self.bounds.apply(number);
        self.number = Some(normalized);
        let value = Value::Number(normalized);
        trace!(path = %self.base.path(), number = normalized, "number commit");
        self.base.schedule_debounce(value.clone(), now);
        InteractionResult::with_actions(vec![
            FieldAction::InputChanged(input),
            FieldAction::Changed(value),
        ])
    }

    fn on_text(&mut self, text: String, now: Instant) -> InteractionResult {
        if text == self.text {
            return InteractionResult::ignored();
        }
        self.text = text;
        let input = Value::Text(self.text.clone());
        match self.text.trim().parse::<f64>().ok().filter(|n| n.is_finite()) {
            Some(number) => self.commit(number, now, input),
            // Partial or non-numeric input is shown but never committed.
            None => InteractionResult::with_action(FieldAction::InputChanged(input)),
        }
    }

    fn on_slider(&mut self, position: f64, now: Instant) -> InteractionResult {
        if !position.is_finite() {
            return InteractionResult::ignored();
        }
        self.dragging = true;
        let result = self.commit(position, now, Value::Number(position));
        self.text = self.number.map(format_number).unwrap_or_default();
        result
    }

    /// Drag end, wherever the pointer was released.
    fn on_release(&mut self) -> InteractionResult {
        if !self.dragging {
            return InteractionResult::ignored();
        }
        self.dragging = false;
        self.base.cancel_debounce();
        self.refresh_error(ValidationMode::Live);
        InteractionResult::with_action(FieldAction::DebouncedChanged(self.value()))
    }

    fn on_blur(&mut self) -> InteractionResult {
        self.base.set_focused(false);
        self.dragging = false;
        self.base.cancel_debounce();
        self.text = self.number.map(format_number).unwrap_or_default();
        self.refresh_error(ValidationMode::Live);
        let value = self.value();
        InteractionResult::with_actions(vec![
            FieldAction::Changed(value.clone()),
            FieldAction::DebouncedChanged(value),
            FieldAction::Blurred,
        ])
    }

    fn track_position(&self) -> Option<usize> {
        let ratio = self.bounds.ratio(self.number.or(self.bounds.min)?)?;
        let raw = (ratio * (self.track_len as f64 - 1.0)).round();
        Some(raw.clamp(0.0, (self.track_len - 1) as f64) as usize)
    }
}

impl Drawable for NumberEditor {
    fn label(&self) -> &str {
        self.base.label()
    }

    fn draw(&self, ctx: &RenderContext) -> DrawOutput {
        let theme = &ctx.theme;
        let mut spans = vec![self.base.label_span(ctx), self.base.label_padding(LABEL_COLUMN)];
        if self.text.is_empty() {
            spans.push(Span::styled("—", theme.placeholder).no_wrap());
        } else {
            spans.push(Span::styled(self.text.clone(), theme.value).no_wrap());
        }

        if let Some(knob) = self.track_position() {
            spans.push(Span::new("  ‹").no_wrap());
            for idx in 0..self.track_len {
                let symbol = if idx == knob { "◈" } else { "—" };
                let span = if idx <= knob {
                    Span::styled(symbol, theme.accent).no_wrap()
                } else {
                    Span::new(symbol).no_wrap()
                };
                spans.push(span);
            }
            spans.push(Span::new("›").no_wrap());
        }
        if let Some(error) = self.base.error_span(theme) {
            spans.push(error);
        }
        DrawOutput::single(spans)
    }
}

impl FieldEditor for NumberEditor {
    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FieldBase {
        &mut self.base
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Number
    }

    fn on_input(&mut self, input: FieldInput, now: Instant) -> InteractionResult {
        match input {
            FieldInput::Focus => {
                self.base.set_focused(true);
                InteractionResult::handled()
            }
            FieldInput::Blur | FieldInput::Submit => self.on_blur(),
            FieldInput::Text(text) => self.on_text(text, now),
            FieldInput::Slider(position) => self.on_slider(position, now),
            FieldInput::SliderRelease | FieldInput::PointerUp => self.on_release(),
            _ => InteractionResult::ignored(),
        }
    }

    fn value(&self) -> Value {
        self.number.map_or(Value::None, Value::Number)
    }

    fn reset_draft(&mut self) {
        self.number = self.base.committed().to_number();
        self.text = self.number.map(format_number).unwrap_or_default();
        self.dragging = false;
    }

    fn dialog_policy(&self) -> Option<ClosePolicy> {
        Some(ClosePolicy::Autosave)
    }

    fn fork(&self) -> Box<dyn FieldEditor> {
        let mut fork = self.clone();
        fork.base = self.base.forked();
        fork.reset_draft();
        Box::new(fork)
    }
}
