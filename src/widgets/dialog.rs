use crate::core::property_path::PropertyPath;
use crate::core::value::Value;
use crate::runtime::Instant;
use crate::runtime::event::FieldAction;
use crate::ui::span::{Span, SpanLine};
use crate::widgets::traits::{
    DrawOutput, Drawable, FieldEditor, FieldInput, InteractionResult, RenderContext,
};
use similar::{ChangeTag, TextDiff};
use tracing::debug;

/// How a fullscreen dialog treats its draft when it closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosePolicy {
    /// Every change commits immediately; closing never prompts.
    Autosave,
    /// Changes stay local until Save; closing a dirty draft asks first.
    ExplicitSave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogPhase {
    Closed,
    Entering,
    Open,
    Closing,
}

/// Viewport measurements used to keep the on-screen keyboard off the
/// active field. Heights are in rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyboardInset {
    pub layout_height: u32,
    pub visual_height: u32,
    /// The platform resizes dynamic viewport units with the keyboard.
    pub dynamic_viewport: bool,
}

impl KeyboardInset {
    pub fn spacer_height(&self) -> u32 {
        if self.dynamic_viewport {
            return 0;
        }
        self.layout_height.saturating_sub(self.visual_height)
    }
}

/// Fullscreen counterpart of an inline editor.
///
/// The bridge edits a fork of the inline editor so nothing reaches the
/// session until the close policy allows it.
pub struct DialogBridge {
    path: PropertyPath,
    phase: DialogPhase,
    policy: ClosePolicy,
    baseline: Value,
    draft: Box<dyn FieldEditor>,
    confirming_discard: bool,
    saved: bool,
    inset: KeyboardInset,
}

impl DialogBridge {
    /// Starts entering a dialog for `editor`, or `None` if the editor has no
    /// fullscreen form.
    pub fn open(editor: &dyn FieldEditor) -> Option<Self> {
        let policy = editor.dialog_policy()?;
        let path = editor.base().path().clone();
        debug!(path = %path, ?policy, "dialog entering");
        Some(Self {
            path,
            phase: DialogPhase::Entering,
            policy,
            baseline: editor.base().committed().clone(),
            draft: editor.fork(),
            confirming_discard: false,
            saved: false,
            inset: KeyboardInset::default(),
        })
    }

    pub fn path(&self) -> &PropertyPath {
        &self.path
    }

    pub fn phase(&self) -> DialogPhase {
        self.phase
    }

    pub fn policy(&self) -> ClosePolicy {
        self.policy
    }

    pub fn baseline(&self) -> &Value {
        &self.baseline
    }

    pub fn draft(&self) -> &dyn FieldEditor {
        self.draft.as_ref()
    }

    pub fn is_confirming_discard(&self) -> bool {
        self.confirming_discard
    }

    /// Whether the dialog closed through Save.
    pub fn was_saved(&self) -> bool {
        self.saved
    }

    pub fn is_dirty(&self) -> bool {
        self.draft.value() != self.baseline
    }

    pub fn set_inset(&mut self, inset: KeyboardInset) {
        self.inset = inset;
    }

    /// Enter transition finished.
    pub fn entered(&mut self) {
        if self.phase == DialogPhase::Entering {
            self.phase = DialogPhase::Open;
        }
    }

    /// Close transition finished.
    pub fn finish_closing(&mut self) {
        if self.phase == DialogPhase::Closing {
            debug!(path = %self.path, saved = self.saved, "dialog closed");
            self.phase = DialogPhase::Closed;
        }
    }

    fn accepts_edits(&self) -> bool {
        matches!(self.phase, DialogPhase::Entering | DialogPhase::Open) && !self.confirming_discard
    }

    pub fn on_input(&mut self, input: FieldInput, now: Instant) -> InteractionResult {
        if !self.accepts_edits() {
            return InteractionResult::ignored();
        }
        let result = self.draft.on_input(input, now);
        self.route(result)
    }

    pub fn on_tick(&mut self, now: Instant) -> InteractionResult {
        let result = self.draft.on_tick(now);
        self.route(result)
    }

    pub fn poll_timeout(&self, now: Instant) -> Option<std::time::Duration> {
        self.draft.base().debounce_due_in(now)
    }

    /// Normalized value came back from the session after an autosave commit.
    pub fn reconcile(&mut self, committed: Value) {
        if self.policy == ClosePolicy::Autosave {
            self.baseline = committed.clone();
        }
        self.draft.reconcile(committed);
    }

    /// Autosave passes commits through; explicit save keeps them local.
    fn route(&self, mut result: InteractionResult) -> InteractionResult {
        if self.policy == ClosePolicy::ExplicitSave {
            result.actions.retain(|action| {
                matches!(
                    action,
                    FieldAction::LimitReached | FieldAction::OptionAction(_) | FieldAction::Notice(_)
                )
            });
        }
        result
    }

    /// Commits the draft through all three tiers and starts closing.
    pub fn save(&mut self) -> InteractionResult {
        if !self.accepts_edits() {
            return InteractionResult::ignored();
        }
        self.draft.base_mut().cancel_debounce();
        let mut result = InteractionResult::handled();
        if self.is_dirty() {
            let value = self.draft.value();
            debug!(path = %self.path, "dialog saved");
            result.push(FieldAction::InputChanged(value.clone()));
            result.push(FieldAction::Changed(value.clone()));
            result.push(FieldAction::DebouncedChanged(value));
            self.saved = true;
        }
        self.phase = DialogPhase::Closing;
        result
    }

    /// Close button. Explicit-save dialogs with unsaved changes ask first.
    pub fn request_close(&mut self) -> InteractionResult {
        if !matches!(self.phase, DialogPhase::Entering | DialogPhase::Open) {
            return InteractionResult::ignored();
        }
        let mut result = InteractionResult::handled();
        match self.policy {
            ClosePolicy::Autosave => {
                if let Some(value) = self.draft.base_mut().flush_debounce() {
                    result.push(FieldAction::DebouncedChanged(value));
                }
                self.phase = DialogPhase::Closing;
            }
            ClosePolicy::ExplicitSave if self.is_dirty() => {
                debug!(path = %self.path, "dialog asking to discard");
                self.confirming_discard = true;
            }
            ClosePolicy::ExplicitSave => {
                self.draft.base_mut().cancel_debounce();
                self.phase = DialogPhase::Closing;
            }
        }
        result
    }

    /// Back navigation goes through the same gate as the close button.
    pub fn back(&mut self) -> InteractionResult {
        self.request_close()
    }

    pub fn confirm_discard(&mut self) -> InteractionResult {
        if !self.confirming_discard {
            return InteractionResult::ignored();
        }
        self.confirming_discard = false;
        self.draft.base_mut().cancel_debounce();
        self.draft.reset_draft();
        self.phase = DialogPhase::Closing;
        debug!(path = %self.path, "dialog draft discarded");
        InteractionResult::handled()
    }

    pub fn cancel_discard(&mut self) -> InteractionResult {
        if !self.confirming_discard {
            return InteractionResult::ignored();
        }
        self.confirming_discard = false;
        InteractionResult::handled()
    }

    fn header(&self, ctx: &RenderContext) -> SpanLine {
        let action = match self.policy {
            ClosePolicy::Autosave => "[Done]",
            ClosePolicy::ExplicitSave => "[Cancel]  [Save]",
        };
        vec![
            Span::styled(self.draft.label().to_string(), ctx.theme.group).no_wrap(),
            Span::new("  ").no_wrap(),
            Span::styled(action, ctx.theme.hint).no_wrap(),
        ]
    }

    fn discard_prompt(&self, ctx: &RenderContext) -> Vec<SpanLine> {
        let mut lines = vec![vec![
            Span::styled("Discard unsaved changes?", ctx.theme.error).no_wrap(),
        ]];
        lines.extend(change_summary(&self.baseline, &self.draft.value(), ctx));
        lines.push(vec![
            Span::styled("[Keep editing]  [Discard]", ctx.theme.hint).no_wrap(),
        ]);
        lines
    }
}

impl Drawable for DialogBridge {
    fn label(&self) -> &str {
        self.draft.label()
    }

    fn draw(&self, ctx: &RenderContext) -> DrawOutput {
        if self.phase == DialogPhase::Closed {
            return DrawOutput::default();
        }
        let mut out = DrawOutput::single(self.header(ctx));
        out.extend(self.draft.draw(ctx));
        if self.confirming_discard {
            out.lines.extend(self.discard_prompt(ctx));
        }
        for _ in 0..self.inset.spacer_height() {
            out.lines.push(Vec::new());
        }
        out
    }
}

impl std::fmt::Debug for DialogBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogBridge")
            .field("path", &self.path)
            .field("phase", &self.phase)
            .field("policy", &self.policy)
            .field("confirming_discard", &self.confirming_discard)
            .finish_non_exhaustive()
    }
}

fn value_lines(value: &Value) -> String {
    match value {
        Value::List(_) => value.to_text_list().join("\n"),
        other => other.to_text_scalar().unwrap_or_default(),
    }
}

/// Line diff between the baseline and the draft for the discard prompt.
pub fn change_summary(baseline: &Value, draft: &Value, ctx: &RenderContext) -> Vec<SpanLine> {
    let old = value_lines(baseline);
    let new = value_lines(draft);
    let diff = TextDiff::from_lines(old.as_str(), new.as_str());
    diff.iter_all_changes()
        .filter_map(|change| {
            let (sign, style) = match change.tag() {
                ChangeTag::Delete => ("- ", ctx.theme.error),
                ChangeTag::Insert => ("+ ", ctx.theme.accent),
                ChangeTag::Equal => return None,
            };
            let text = change.value().trim_end_matches('\n');
            Some(vec![Span::styled(format!("{sign}{text}"), style).no_wrap()])
        })
        .collect()
}
