use crate::core::property_path::PropertyPath;
use crate::core::value::Value;
use crate::runtime::Instant;
use crate::runtime::debounce::Debouncer;
use crate::ui::span::Span;
use crate::ui::theme::Theme;
use crate::widgets::traits::RenderContext;
use crate::widgets::validators::{Validator, run_validators};
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

/// State every field editor carries besides its own draft.
#[derive(Clone)]
pub struct FieldBase {
    path: PropertyPath,
    label: String,
    committed: Value,
    error: Option<String>,
    focused: bool,
    busy: bool,
    debouncer: Debouncer<Value>,
    validators: Vec<Validator>,
}

impl FieldBase {
    pub fn new(path: impl Into<PropertyPath>, label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
            committed: Value::None,
            error: None,
            focused: false,
            busy: false,
            debouncer: Debouncer::new(Duration::from_millis(500)),
            validators: Vec::new(),
        }
    }

    /// Path relative to the renderer that owns the editor.
    pub fn path(&self) -> &PropertyPath {
        &self.path
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn committed(&self) -> &Value {
        &self.committed
    }

    /// Returns false when `committed` equals the current value.
    pub fn accept_committed(&mut self, committed: Value) -> bool {
        if self.committed == committed {
            return false;
        }
        self.committed = committed;
        true
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// An upload or delete is in flight; the editor refuses new commits.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub fn set_debounce(&mut self, delay: Duration) {
        self.debouncer.set_delay(delay);
    }

    pub fn schedule_debounce(&mut self, value: Value, now: Instant) {
        self.debouncer.schedule(value, now);
    }

    pub fn poll_debounce(&mut self, now: Instant) -> Option<Value> {
        self.debouncer.poll(now)
    }

    pub fn flush_debounce(&mut self) -> Option<Value> {
        self.debouncer.flush()
    }

    pub fn cancel_debounce(&mut self) -> Option<Value> {
        self.debouncer.cancel()
    }

    pub fn debounce_due_in(&self, now: Instant) -> Option<Duration> {
        self.debouncer.time_until_due(now)
    }

    pub fn add_validator(&mut self, validator: Validator) {
        self.validators.push(validator);
    }

    pub fn run_validators(&self, value: &Value) -> Result<(), String> {
        run_validators(&self.validators, value)
    }

    /// Copy for a dialog draft: same configuration, no focus, no pending timer.
    pub fn forked(&self) -> Self {
        let mut base = self.clone();
        base.focused = false;
        base.busy = false;
        base.error = None;
        base.debouncer.cancel();
        base
    }

    pub fn label_span(&self, ctx: &RenderContext) -> Span {
        let marker = if self.focused { ">" } else { " " };
        Span::styled(format!("{marker} {}", self.label), ctx.theme.label).no_wrap()
    }

    /// Padding that aligns values after labels of different display width.
    pub fn label_padding(&self, column: usize) -> Span {
        let used = UnicodeWidthStr::width(self.label.as_str()) + 2;
        Span::new(" ".repeat(column.saturating_sub(used).max(1))).no_wrap()
    }

    pub fn error_span(&self, theme: &Theme) -> Option<Span> {
        self.error
            .as_ref()
            .map(|error| Span::styled(format!("  ✗ {error}"), theme.error).no_wrap())
    }
}

impl std::fmt::Debug for FieldBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldBase")
            .field("path", &self.path)
            .field("committed", &self.committed)
            .field("error", &self.error)
            .field("focused", &self.focused)
            .finish_non_exhaustive()
    }
}
