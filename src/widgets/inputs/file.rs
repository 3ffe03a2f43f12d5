use crate::core::error::{ConfigError, ResourceError};
use crate::core::property_path::PropertyPath;
use crate::core::value::Value;
use crate::inspector::field::FileSpec;
use crate::runtime::Instant;
use crate::runtime::event::FieldAction;
use crate::runtime::notice::Notice;
use crate::runtime::request::{FileReference, LocalFile};
use crate::ui::span::Span;
use crate::widgets::base::FieldBase;
use crate::widgets::traits::{
    DrawOutput, Drawable, FieldEditor, FieldInput, FieldKind, InteractionResult, RenderContext,
};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::sync::Arc;
use tracing::{debug, error, warn};

const LABEL_COLUMN: usize = 18;

/// Runs before a delete request leaves the editor, for cleanup of resources
/// that reference the stored file.
pub type PreDeleteHook = Arc<dyn Fn(&FileReference) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilePreview {
    Empty,
    /// Optimistic preview while the upload is in flight.
    Local(LocalFile),
    Remote(FileReference),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Upload(u64),
    Delete(u64),
}

#[derive(Clone)]
pub struct FileEditor {
    base: FieldBase,
    preview: FilePreview,
    max_bytes: u64,
    accept: Option<GlobSet>,
    accept_patterns: Vec<String>,
    generation: u64,
    pending: Option<Pending>,
    pre_delete: Option<PreDeleteHook>,
}

impl FileEditor {
    pub fn new(path: impl Into<PropertyPath>, label: impl Into<String>, max_bytes: u64) -> Self {
        Self {
            base: FieldBase::new(path, label),
            preview: FilePreview::Empty,
            max_bytes,
            accept: None,
            accept_patterns: Vec::new(),
            generation: 0,
            pending: None,
            pre_delete: None,
        }
    }

    /// `max_upload` is the engine-wide limit; `FileSpec::max_bytes` can only lower it.
    pub fn from_spec(
        path: impl Into<PropertyPath>,
        label: impl Into<String>,
        spec: &FileSpec,
        max_upload: u64,
    ) -> Result<Self, ConfigError> {
        let max_bytes = spec.max_bytes.map_or(max_upload, |limit| limit.min(max_upload));
        Self::new(path, label, max_bytes).with_accept(&spec.accept)
    }

    pub fn with_accept<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self, ConfigError> {
        if patterns.is_empty() {
            self.accept = None;
            self.accept_patterns.clear();
            return Ok(self);
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = GlobBuilder::new(pattern)
                .case_insensitive(true)
                .literal_separator(true)
                .build()
                .map_err(|source| ConfigError::Glob {
                    pattern: pattern.to_string(),
                    source,
                })?;
            builder.add(glob);
        }
        let joined: Vec<String> = patterns.iter().map(|p| p.as_ref().to_string()).collect();
        let set = builder.build().map_err(|source| ConfigError::Glob {
            pattern: joined.join(","),
            source,
        })?;
        self.accept = Some(set);
        self.accept_patterns = joined;
        Ok(self)
    }

    pub fn with_pre_delete(mut self, hook: PreDeleteHook) -> Self {
        self.pre_delete = Some(hook);
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.reconcile(value);
        self
    }

    pub fn preview(&self) -> &FilePreview {
        &self.preview
    }

    fn committed_preview(&self) -> FilePreview {
        FileReference::from_value(self.base.committed()).map_or(FilePreview::Empty, FilePreview::Remote)
    }

    fn reject(&self, message: String) -> InteractionResult {
        warn!(path = %self.base.path(), %message, "file rejected");
        InteractionResult::with_action(FieldAction::Notice(Notice::warning(message)))
    }

    fn on_pick(&mut self, file: LocalFile) -> InteractionResult {
        if self.base.is_busy() {
            return InteractionResult::ignored();
        }
        if file.size > self.max_bytes {
            return self.reject(format!(
                "{} is larger than the {} limit",
                file.name,
                format_bytes(self.max_bytes)
            ));
        }
        if let Some(accept) = &self.accept
            && !accept.is_match(&file.name)
        {
            return self.reject(format!(
                "{} is not an accepted file type ({})",
                file.name,
                self.accept_patterns.join(", ")
            ));
        }

        self.generation += 1;
        self.pending = Some(Pending::Upload(self.generation));
        self.base.set_busy(true);
        self.preview = FilePreview::Local(file.clone());
        debug!(path = %self.base.path(), generation = self.generation, name = %file.name, "upload requested");
        InteractionResult::with_action(FieldAction::UploadRequested {
            generation: self.generation,
            file,
        })
    }

    fn on_delete(&mut self) -> InteractionResult {
        if self.base.is_busy() {
            return InteractionResult::ignored();
        }
        let Some(reference) = FileReference::from_value(self.base.committed()) else {
            return InteractionResult::ignored();
        };
        if let Some(hook) = &self.pre_delete {
            hook(&reference);
        }
        self.generation += 1;
        self.pending = Some(Pending::Delete(self.generation));
        self.base.set_busy(true);
        debug!(path = %self.base.path(), generation = self.generation, key = %reference.storage_key, "delete requested");
        InteractionResult::with_action(FieldAction::DeleteRequested {
            generation: self.generation,
            storage_key: reference.storage_key,
        })
    }

    fn commit(&self, value: Value) -> InteractionResult {
        InteractionResult::with_actions(vec![
            FieldAction::InputChanged(value.clone()),
            FieldAction::Changed(value.clone()),
            FieldAction::DebouncedChanged(value),
        ])
    }
}

fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MiB", bytes / MIB)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{} KiB", bytes / KIB)
    } else {
        format!("{bytes} bytes")
    }
}

impl Drawable for FileEditor {
    fn label(&self) -> &str {
        self.base.label()
    }

    fn draw(&self, ctx: &RenderContext) -> DrawOutput {
        let theme = &ctx.theme;
        let mut spans = vec![self.base.label_span(ctx), self.base.label_padding(LABEL_COLUMN)];
        match &self.preview {
            FilePreview::Empty => spans.push(Span::styled("No file", theme.placeholder).no_wrap()),
            FilePreview::Local(file) => {
                spans.push(Span::styled(file.name.clone(), theme.value).no_wrap());
                spans.push(Span::styled("  uploading…", theme.hint).no_wrap());
            }
            FilePreview::Remote(reference) => {
                spans.push(Span::styled(reference.name.clone(), theme.value).no_wrap());
                if matches!(self.pending, Some(Pending::Delete(_))) {
                    spans.push(Span::styled("  deleting…", theme.hint).no_wrap());
                }
            }
        }
        if let Some(error) = self.base.error_span(theme) {
            spans.push(error);
        }
        DrawOutput::single(spans)
    }
}

impl FieldEditor for FileEditor {
    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FieldBase {
        &mut self.base
    }

    fn kind(&self) -> FieldKind {
        FieldKind::File
    }

    fn on_input(&mut self, input: FieldInput, _now: Instant) -> InteractionResult {
        match input {
            FieldInput::Focus => {
                self.base.set_focused(true);
                InteractionResult::handled()
            }
            FieldInput::Blur => {
                self.base.set_focused(false);
                InteractionResult::with_action(FieldAction::Blurred)
            }
            FieldInput::PickFile(file) => self.on_pick(file),
            FieldInput::DeleteFile => self.on_delete(),
            _ => InteractionResult::ignored(),
        }
    }

    /// The stored reference. A local preview is not a value until it uploads.
    fn value(&self) -> Value {
        match &self.preview {
            FilePreview::Remote(reference) => reference.to_value(),
            FilePreview::Local(_) => self.base.committed().clone(),
            FilePreview::Empty => Value::None,
        }
    }

    fn reset_draft(&mut self) {
        if self.pending.is_none() {
            self.preview = self.committed_preview();
        }
    }

    fn fork(&self) -> Box<dyn FieldEditor> {
        let mut fork = self.clone();
        fork.base = self.base.forked();
        fork.pending = None;
        fork.reset_draft();
        Box::new(fork)
    }

    fn resolve_upload(
        &mut self,
        generation: u64,
        result: Result<FileReference, ResourceError>,
    ) -> InteractionResult {
        if self.pending != Some(Pending::Upload(generation)) {
            debug!(path = %self.base.path(), generation, "stale upload result dropped");
            return InteractionResult::ignored();
        }
        self.pending = None;
        self.base.set_busy(false);
        match result {
            Ok(reference) => {
                let value = reference.to_value();
                self.preview = FilePreview::Remote(reference);
                self.commit(value)
            }
            Err(err) => {
                error!(path = %self.base.path(), error = %err, "upload failed");
                self.preview = self.committed_preview();
                InteractionResult::with_action(FieldAction::Notice(Notice::error(format!(
                    "Upload failed: {err}"
                ))))
            }
        }
    }

    fn resolve_delete(&mut self, generation: u64, result: Result<(), ResourceError>) -> InteractionResult {
        if self.pending != Some(Pending::Delete(generation)) {
            debug!(path = %self.base.path(), generation, "stale delete result dropped");
            return InteractionResult::ignored();
        }
        self.pending = None;
        self.base.set_busy(false);
        self.preview = FilePreview::Empty;
        let mut out = self.commit(Value::None);
        if let Err(err) = result {
            // Local state is cleared either way.
            error!(path = %self.base.path(), error = %err, "delete failed");
            out.push(FieldAction::Notice(Notice::error(format!("Delete failed: {err}"))));
        }
        out
    }
}
