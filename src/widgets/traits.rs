use crate::core::value::Value;
use crate::runtime::Instant;
use crate::runtime::event::FieldAction;
use crate::runtime::request::{FileReference, LocalFile};
use crate::core::error::ResourceError;
use crate::ui::span::SpanLine;
use crate::ui::theme::Theme;
use crate::widgets::base::FieldBase;
use crate::widgets::dialog::ClosePolicy;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Controls how strictly an editor validates its current value.
///
/// - `Live`: settle tier and blur; partial input is acceptable.
/// - `Submit`: the form is about to hand documents to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    Live,
    Submit,
}

// ---------------------------------------------------------------------------
// Render context & output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RenderContext {
    pub theme: Theme,
    pub width: u16,
}

impl RenderContext {
    pub fn new(theme: Theme, width: u16) -> Self {
        Self { theme, width }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DrawOutput {
    pub lines: Vec<SpanLine>,
}

impl DrawOutput {
    pub fn single(line: SpanLine) -> Self {
        Self { lines: vec![line] }
    }

    pub fn extend(&mut self, other: DrawOutput) {
        self.lines.extend(other.lines);
    }

    /// Plain text of every line, for logs and tests.
    pub fn to_plain_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.iter().map(|span| span.text.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub trait Drawable: Send {
    fn label(&self) -> &str {
        ""
    }
    fn draw(&self, ctx: &RenderContext) -> DrawOutput;
}

// ---------------------------------------------------------------------------
// Input events
// ---------------------------------------------------------------------------

/// UI interactions delivered to a field editor.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    Focus,
    Blur,
    /// Full contents of the text box after a keystroke.
    Text(String),
    /// Slider dragged to a position (in value units).
    Slider(f64),
    SliderRelease,
    /// Pointer released anywhere in the document.
    PointerUp,
    Toggle,
    SetChecked(bool),
    PickFile(LocalFile),
    DeleteFile,
    /// Autocomplete search text.
    Query(String),
    Select(String),
    Remove(String),
    Clear,
    /// Enter in the input.
    Submit,
    CloseList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    File,
    Tags,
    Reference,
}

// ---------------------------------------------------------------------------
// InteractionResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct InteractionResult {
    /// The editor consumed the input, even if it produced no action.
    pub handled: bool,
    pub actions: Vec<FieldAction>,
}

impl InteractionResult {
    pub fn ignored() -> Self {
        Self::default()
    }

    pub fn handled() -> Self {
        Self {
            handled: true,
            actions: Vec::new(),
        }
    }

    pub fn with_action(action: FieldAction) -> Self {
        Self {
            handled: true,
            actions: vec![action],
        }
    }

    pub fn with_actions(actions: Vec<FieldAction>) -> Self {
        Self { handled: true, actions }
    }

    pub fn push(&mut self, action: FieldAction) {
        self.handled = true;
        self.actions.push(action);
    }
}

// ---------------------------------------------------------------------------
// FieldEditor
// ---------------------------------------------------------------------------

/// A typed editor bound to one property path.
///
/// Editors keep a draft separate from the committed value. They never touch
/// documents; every change leaves as a [`FieldAction`].
pub trait FieldEditor: Drawable {
    fn base(&self) -> &FieldBase;
    fn base_mut(&mut self) -> &mut FieldBase;
    fn kind(&self) -> FieldKind;

    fn on_input(&mut self, input: FieldInput, now: Instant) -> InteractionResult;

    /// Fires the settle tier once the debounce interval has elapsed.
    fn on_tick(&mut self, now: Instant) -> InteractionResult {
        match self.base_mut().poll_debounce(now) {
            Some(value) => {
                self.refresh_error(ValidationMode::Live);
                InteractionResult::with_action(FieldAction::DebouncedChanged(value))
            }
            None => InteractionResult::ignored(),
        }
    }

    /// The draft, as the value it would commit.
    fn value(&self) -> Value;

    /// Parent supplied a committed value. Equal values are a no-op; a new
    /// value replaces the draft unless a focused edit is in progress.
    fn reconcile(&mut self, committed: Value) {
        let dirty = self.value() != *self.base().committed();
        if !self.base_mut().accept_committed(committed) {
            return;
        }
        if !(self.base().is_focused() && dirty) {
            self.reset_draft();
        }
    }

    /// Replaces the draft with the committed value.
    fn reset_draft(&mut self);

    fn validate(&self, _mode: ValidationMode) -> Result<(), String> {
        self.base().run_validators(&self.value())
    }

    fn refresh_error(&mut self, mode: ValidationMode) {
        let error = self.validate(mode).err();
        self.base_mut().set_error(error);
    }

    fn dialog_policy(&self) -> Option<ClosePolicy> {
        None
    }

    /// Independent copy seeded from the committed value, used as a dialog draft.
    fn fork(&self) -> Box<dyn FieldEditor>;

    fn resolve_upload(
        &mut self,
        _generation: u64,
        _result: Result<FileReference, ResourceError>,
    ) -> InteractionResult {
        InteractionResult::ignored()
    }

    fn resolve_delete(
        &mut self,
        _generation: u64,
        _result: Result<(), ResourceError>,
    ) -> InteractionResult {
        InteractionResult::ignored()
    }
}
