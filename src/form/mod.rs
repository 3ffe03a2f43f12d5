//! The property tree renderer: a mounted, batch-aware form over a set of
//! documents of known kinds.
//!
//! A [`PropertyForm`] owns the [`EditSession`], the tree of field editors
//! and at most one open [`DialogBridge`]. Hosts feed it [`FieldInput`]s and
//! clock ticks; it answers with [`FormEvent`]s in the order they happened.
//! Asynchronous work (settle-tier validation, uploads, deletes) leaves as a
//! request event carrying a [`Ticket`] and comes back through the matching
//! `resolve_*` method.

pub mod group;
pub mod layout;
pub mod session;

use crate::config::EngineConfig;
use crate::core::document::Document;
use crate::core::error::{EngineError, ResourceError};
use crate::core::property_path::{PropertyPath, SEPARATOR};
use crate::core::value::Value;
use crate::inspector::{DocumentKind, InspectorResolver};
use crate::runtime::event::{FieldAction, FormEvent};
use crate::runtime::notice::{Notifier, SilentNotifier};
use crate::runtime::request::{DeleteRequest, FileReference, Ticket, UploadRequest, ValidationRequest};
use crate::runtime::Instant;
use crate::ui::theme::Theme;
use crate::widgets::dialog::{DialogBridge, DialogPhase};
use crate::widgets::inputs::{PreDeleteHook, ReferenceTarget};
use crate::widgets::traits::{DrawOutput, Drawable, FieldInput, InteractionResult, RenderContext, ValidationMode};
use group::{
    BuildContext, EditorPool, FormNode, build_nodes, detach, draw_nodes, find_editor, find_editor_mut,
    for_each_editor, group_mut, next_due, rebuild_groups, route_input, tick_all,
};
use indexmap::{IndexMap, IndexSet};
use layout::{derive_paths, leaf_paths};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

pub use group::GroupRenderer;
pub use layout::LayoutEntry;
pub use session::EditSession;

/// Per-form settings supplied at mount.
#[derive(Clone, Default)]
pub struct FormOptions {
    /// Explicit layout. When `None` the paths are derived from the first
    /// document and re-derived after every commit.
    pub property_paths: Option<Vec<PropertyPath>>,
    /// Emit [`FormEvent::ValidationRequested`] on the settle tier.
    pub async_validation: bool,
    pub reference_targets: IndexMap<DocumentKind, Vec<ReferenceTarget>>,
    /// Runs before a file property asks the host to delete its stored blob.
    pub pre_delete: IndexMap<PropertyPath, PreDeleteHook>,
    pub config: EngineConfig,
}

impl std::fmt::Debug for FormOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormOptions")
            .field("property_paths", &self.property_paths)
            .field("async_validation", &self.async_validation)
            .field("reference_targets", &self.reference_targets)
            .field("pre_delete", &self.pre_delete.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}

impl FormOptions {
    pub fn with_property_paths<P: Into<PropertyPath>>(mut self, paths: impl IntoIterator<Item = P>) -> Self {
        self.property_paths = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_async_validation(mut self, enabled: bool) -> Self {
        self.async_validation = enabled;
        self
    }

    pub fn with_reference_targets(mut self, kind: DocumentKind, targets: Vec<ReferenceTarget>) -> Self {
        self.reference_targets.insert(kind, targets);
        self
    }

    pub fn with_pre_delete(mut self, path: impl Into<PropertyPath>, hook: PreDeleteHook) -> Self {
        self.pre_delete.insert(path.into(), hook);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }
}

/// Handles a form reaches for instead of globals.
#[derive(Clone)]
pub struct FormContext {
    pub notifier: Arc<dyn Notifier>,
    pub theme: Theme,
}

impl FormContext {
    pub fn new(notifier: Arc<dyn Notifier>, theme: Theme) -> Self {
        Self { notifier, theme }
    }
}

impl Default for FormContext {
    fn default() -> Self {
        Self {
            notifier: Arc::new(SilentNotifier),
            theme: Theme::default(),
        }
    }
}

/// Settle-tier validation awaiting one answer per batch document.
#[derive(Debug)]
struct ValidationRound {
    generation: u64,
    answers: Vec<Option<Option<String>>>,
}

struct ActiveDialog {
    path: PropertyPath,
    bridge: DialogBridge,
}

pub struct PropertyForm {
    resolver: Arc<dyn InspectorResolver + Send + Sync>,
    options: FormOptions,
    context: FormContext,
    session: EditSession,
    paths: Vec<PropertyPath>,
    nodes: Vec<FormNode>,
    dialog: Option<ActiveDialog>,
    rounds: IndexMap<PropertyPath, ValidationRound>,
    generation: u64,
}

impl PropertyForm {
    pub fn mount<R>(
        documents: Vec<Document>,
        resolver: R,
        options: FormOptions,
        context: FormContext,
    ) -> Result<Self, EngineError>
    where
        R: InspectorResolver + Send + Sync + 'static,
    {
        let resolver: Arc<dyn InspectorResolver + Send + Sync> = Arc::new(resolver);
        let mut session = EditSession::mount(documents, resolver.as_ref())?;
        let paths = match &options.property_paths {
            Some(paths) => paths.clone(),
            None => derive_paths(session.primary_inspector().as_ref(), session.primary()),
        };
        if options.config.expand_groups {
            for prefix in group_prefixes(&leaf_paths(&paths, session.primary())) {
                session.set_expanded(&prefix, true);
            }
        }
        let mut form = Self {
            resolver,
            options,
            context,
            session,
            paths: Vec::new(),
            nodes: Vec::new(),
            dialog: None,
            rounds: IndexMap::new(),
            generation: 0,
        };
        form.install_layout(paths)?;
        debug!(
            documents = form.session.len(),
            properties = form.paths.len(),
            "property form mounted"
        );
        Ok(form)
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn documents(&self) -> &[Document] {
        self.session.documents()
    }

    /// Top-level property paths in display order.
    pub fn paths(&self) -> &[PropertyPath] {
        &self.paths
    }

    pub fn nodes(&self) -> &[FormNode] {
        &self.nodes
    }

    pub fn errors(&self) -> IndexMap<PropertyPath, String> {
        self.session.errors()
    }

    pub fn error(&self, path: &PropertyPath) -> Option<&str> {
        self.session.error(path)
    }

    pub fn editor(&self, path: &PropertyPath) -> Option<&dyn crate::widgets::traits::FieldEditor> {
        find_editor(&self.nodes, path)
    }

    pub fn dialog(&self) -> Option<&DialogBridge> {
        self.dialog.as_ref().map(|dialog| &dialog.bridge)
    }

    pub fn is_submitting(&self) -> bool {
        self.session.is_submitting()
    }

    /// Delivers one UI interaction to the inline editor at `path`.
    pub fn handle(&mut self, path: &PropertyPath, input: FieldInput, now: Instant) -> Result<Vec<FormEvent>, EngineError> {
        trace!(path = %path, ?input, "field input");
        let (relative, result) = route_input(&mut self.nodes, path, input, now)
            .ok_or_else(|| EngineError::UnknownProperty(path.clone()))?;
        if !result.handled {
            trace!(path = %path, "input ignored");
            return Ok(Vec::new());
        }
        self.process(&relative, result)
    }

    /// Fires every due debouncer.
    pub fn tick(&mut self, now: Instant) -> Result<Vec<FormEvent>, EngineError> {
        let mut events = Vec::new();
        for (path, result) in tick_all(&mut self.nodes, now) {
            events.extend(self.process(&path, result)?);
        }
        if let Some(dialog) = self.dialog.as_mut() {
            let path = dialog.path.clone();
            let result = dialog.bridge.on_tick(now);
            events.extend(self.process(&path, result)?);
        }
        Ok(events)
    }

    /// How long a host loop may sleep before the next [`tick`](Self::tick).
    pub fn poll_timeout(&self, now: Instant, default: Duration) -> Duration {
        let dialog = self.dialog.as_ref().and_then(|dialog| dialog.bridge.poll_timeout(now));
        [next_due(&self.nodes, now), dialog]
            .into_iter()
            .flatten()
            .fold(default, Duration::min)
    }

    // -----------------------------------------------------------------------
    // Propagation
    // -----------------------------------------------------------------------

    fn process(&mut self, path: &PropertyPath, result: InteractionResult) -> Result<Vec<FormEvent>, EngineError> {
        let mut events = Vec::new();
        for action in result.actions {
            match action {
                FieldAction::InputChanged(value) => {
                    events.push(FormEvent::InputChanged {
                        path: path.clone(),
                        value,
                    });
                }
                FieldAction::Changed(value) => {
                    events.extend(self.commit(path, value)?);
                }
                FieldAction::DebouncedChanged(_) => {
                    events.push(FormEvent::DebouncedChanged {
                        path: path.clone(),
                        value: self.session.value(path),
                    });
                    if self.options.async_validation {
                        events.extend(self.start_validation(path));
                    }
                }
                FieldAction::Blurred => {
                    events.push(FormEvent::Blurred { path: path.clone() });
                    events.extend(self.revalidate(path, ValidationMode::Live));
                }
                FieldAction::LimitReached => events.push(FormEvent::LimitReached { path: path.clone() }),
                FieldAction::OptionAction(action) => events.push(FormEvent::OptionAction {
                    path: path.clone(),
                    action,
                }),
                FieldAction::UploadRequested { generation, file } => {
                    events.push(FormEvent::UploadRequested(UploadRequest {
                        ticket: self.ticket(generation),
                        path: path.clone(),
                        file,
                    }));
                }
                FieldAction::DeleteRequested { generation, storage_key } => {
                    events.push(FormEvent::DeleteRequested(DeleteRequest {
                        ticket: self.ticket(generation),
                        path: path.clone(),
                        storage_key,
                    }));
                }
                FieldAction::Notice(notice) => self.context.notifier.notify(notice),
            }
        }
        self.sync_editor_errors();
        Ok(events)
    }

    /// Commit tier: normalize into every working copy, then bring the
    /// layout, the editors and the error map up to date.
    fn commit(&mut self, path: &PropertyPath, value: Value) -> Result<Vec<FormEvent>, EngineError> {
        let normalized = self.session.apply(path, value);
        if self.rounds.shift_remove(path).is_some() {
            debug!(path = %path, "pending validation superseded by commit");
        }
        let mut events = self.refresh_layout()?;
        self.reconcile_editors();
        events.push(FormEvent::Changed {
            path: path.clone(),
            value: normalized,
        });
        events.extend(self.revalidate(path, ValidationMode::Live));
        for other in self.session.error_paths() {
            if other != *path {
                events.extend(self.revalidate(&other, ValidationMode::Live));
            }
        }
        Ok(events)
    }

    fn ticket(&self, generation: u64) -> Ticket {
        Ticket {
            epoch: self.session.epoch(),
            generation,
        }
    }

    /// Editor validators first, then the inspectors across the batch.
    fn sync_error(&self, path: &PropertyPath, mode: ValidationMode) -> Option<String> {
        let local = find_editor(&self.nodes, path).and_then(|editor| editor.validate(mode).err());
        local.or_else(|| self.session.compute_error(path))
    }

    fn revalidate(&mut self, path: &PropertyPath, mode: ValidationMode) -> Vec<FormEvent> {
        let error = self.sync_error(path, mode);
        self.session.set_sync_error(path, error)
    }

    fn start_validation(&mut self, path: &PropertyPath) -> Vec<FormEvent> {
        self.generation += 1;
        let ticket = self.ticket(self.generation);
        let documents = self.session.documents();
        self.rounds.insert(
            path.clone(),
            ValidationRound {
                generation: ticket.generation,
                answers: vec![None; documents.len()],
            },
        );
        debug!(path = %path, generation = ticket.generation, "validation round started");
        documents
            .iter()
            .enumerate()
            .map(|(doc_index, document)| {
                FormEvent::ValidationRequested(ValidationRequest {
                    ticket,
                    path: path.clone(),
                    doc_index,
                    value: document.get(path).cloned().unwrap_or_default(),
                    document: document.clone(),
                })
            })
            .collect()
    }

    /// Re-derives the layout when it is not fixed. Editors of paths that
    /// stay visible keep their drafts.
    fn refresh_layout(&mut self) -> Result<Vec<FormEvent>, EngineError> {
        if self.options.property_paths.is_some() {
            self.rebuild_marker_groups()?;
            return Ok(Vec::new());
        }
        let paths = derive_paths(self.session.primary_inspector().as_ref(), self.session.primary());
        if paths == self.paths {
            self.rebuild_marker_groups()?;
            return Ok(Vec::new());
        }
        debug!(before = self.paths.len(), after = paths.len(), "visible properties changed");
        self.install_layout(paths)?;

        let visible: IndexSet<PropertyPath> = leaf_paths(&self.paths, self.session.primary()).into_iter().collect();
        let mut events = Vec::new();
        for path in self.session.error_paths() {
            if !visible.contains(&path) {
                events.extend(self.session.set_sync_error(&path, None));
                events.extend(self.session.set_async_error(&path, None));
            }
        }
        Ok(events)
    }

    fn install_layout(&mut self, paths: Vec<PropertyPath>) -> Result<(), EngineError> {
        let mut pool = EditorPool::new();
        detach(std::mem::take(&mut self.nodes), &PropertyPath::root(), &mut pool);
        let session = &self.session;
        let expanded = |path: &PropertyPath| session.is_expanded(path);
        let ctx = BuildContext {
            inspector: session.primary_inspector().as_ref(),
            document: session.primary(),
            config: &self.options.config,
            targets: &self.options.reference_targets,
            pre_delete: &self.options.pre_delete,
            expanded: &expanded,
        };
        self.nodes = build_nodes(&PropertyPath::root(), &paths, &ctx, &mut pool)?;
        self.paths = paths;
        Ok(())
    }

    fn rebuild_marker_groups(&mut self) -> Result<(), EngineError> {
        let mut pool = EditorPool::new();
        let session = &self.session;
        let expanded = |path: &PropertyPath| session.is_expanded(path);
        let ctx = BuildContext {
            inspector: session.primary_inspector().as_ref(),
            document: session.primary(),
            config: &self.options.config,
            targets: &self.options.reference_targets,
            pre_delete: &self.options.pre_delete,
            expanded: &expanded,
        };
        rebuild_groups(&mut self.nodes, &ctx, &mut pool)
    }

    fn reconcile_editors(&mut self) {
        let session = &self.session;
        for_each_editor(&mut self.nodes, &PropertyPath::root(), &mut |path, editor| {
            editor.reconcile(session.value(path));
        });
        if let Some(dialog) = self.dialog.as_mut() {
            dialog.bridge.reconcile(session.value(&dialog.path));
        }
    }

    /// Shows the session's error on editors whose own validators pass.
    fn sync_editor_errors(&mut self) {
        let session = &self.session;
        for_each_editor(&mut self.nodes, &PropertyPath::root(), &mut |path, editor| {
            let local = editor.validate(ValidationMode::Live).err();
            let error = local.or_else(|| session.error(path).map(str::to_string));
            editor.base_mut().set_error(error);
        });
    }

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    /// Expands or collapses the group at `path` (with trailing separator).
    pub fn toggle_group(&mut self, path: &PropertyPath) -> Result<Vec<FormEvent>, EngineError> {
        let expanded = !group_mut(&mut self.nodes, path)
            .ok_or_else(|| EngineError::UnknownProperty(path.clone()))?
            .is_expanded();
        self.session.set_expanded(path, expanded);

        let mut pool = EditorPool::new();
        let session = &self.session;
        let is_expanded = |path: &PropertyPath| session.is_expanded(path);
        let ctx = BuildContext {
            inspector: session.primary_inspector().as_ref(),
            document: session.primary(),
            config: &self.options.config,
            targets: &self.options.reference_targets,
            pre_delete: &self.options.pre_delete,
            expanded: &is_expanded,
        };
        if let Some(group) = group_mut(&mut self.nodes, path) {
            group.set_expanded(expanded, &ctx, &mut pool)?;
        }
        debug!(group = %path, expanded, "group toggled");
        self.sync_editor_errors();
        Ok(vec![FormEvent::ExpandProperty {
            path: path.clone(),
            expanded,
        }])
    }

    // -----------------------------------------------------------------------
    // Dialog bridge
    // -----------------------------------------------------------------------

    /// Activates the field at `path`. Narrow viewports open a fullscreen
    /// dialog for editors that have one; everything else focuses inline.
    pub fn activate(
        &mut self,
        path: &PropertyPath,
        viewport_width: u32,
        now: Instant,
    ) -> Result<Vec<FormEvent>, EngineError> {
        if self.dialog.is_some() {
            return Ok(Vec::new());
        }
        let editor = find_editor(&self.nodes, path).ok_or_else(|| EngineError::UnknownProperty(path.clone()))?;
        if self.options.config.is_narrow(viewport_width)
            && let Some(bridge) = DialogBridge::open(editor)
        {
            self.dialog = Some(ActiveDialog {
                path: path.clone(),
                bridge,
            });
            return Ok(vec![FormEvent::DialogOpened { path: path.clone() }]);
        }
        self.handle(path, FieldInput::Focus, now)
    }

    fn dialog_step(
        &mut self,
        step: impl FnOnce(&mut DialogBridge) -> InteractionResult,
    ) -> Result<Vec<FormEvent>, EngineError> {
        let Some(dialog) = self.dialog.as_mut() else {
            return Ok(Vec::new());
        };
        let before = dialog.bridge.phase();
        let result = step(&mut dialog.bridge);
        let after = dialog.bridge.phase();
        let saved = dialog.bridge.was_saved();
        let path = dialog.path.clone();

        let mut events = self.process(&path, result)?;
        if before != DialogPhase::Closing && after == DialogPhase::Closing {
            events.push(FormEvent::DialogClosed { path, saved });
        }
        Ok(events)
    }

    /// The enter transition finished.
    pub fn dialog_entered(&mut self) {
        if let Some(dialog) = self.dialog.as_mut() {
            dialog.bridge.entered();
        }
    }

    pub fn dialog_input(&mut self, input: FieldInput, now: Instant) -> Result<Vec<FormEvent>, EngineError> {
        self.dialog_step(|bridge| bridge.on_input(input, now))
    }

    pub fn dialog_save(&mut self) -> Result<Vec<FormEvent>, EngineError> {
        self.dialog_step(DialogBridge::save)
    }

    pub fn dialog_close(&mut self) -> Result<Vec<FormEvent>, EngineError> {
        self.dialog_step(DialogBridge::request_close)
    }

    pub fn dialog_back(&mut self) -> Result<Vec<FormEvent>, EngineError> {
        self.dialog_step(DialogBridge::back)
    }

    pub fn dialog_confirm_discard(&mut self) -> Result<Vec<FormEvent>, EngineError> {
        self.dialog_step(DialogBridge::confirm_discard)
    }

    pub fn dialog_cancel_discard(&mut self) -> Result<Vec<FormEvent>, EngineError> {
        self.dialog_step(DialogBridge::cancel_discard)
    }

    /// The close transition finished; the dialog is dropped.
    pub fn dialog_finished(&mut self) {
        if let Some(dialog) = self.dialog.as_mut() {
            dialog.bridge.finish_closing();
            if dialog.bridge.phase() == DialogPhase::Closed {
                self.dialog = None;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    /// Recomputes the synchronous error map over every visible leaf of every
    /// document. Emits [`FormEvent::Submitted`] only when nothing is wrong.
    pub fn submit(&mut self) -> Vec<FormEvent> {
        if !self.session.begin_submit() {
            debug!("submit ignored while another is in progress");
            return Vec::new();
        }
        let mut events = Vec::new();
        for path in leaf_paths(&self.paths, self.session.primary()) {
            events.extend(self.revalidate(&path, ValidationMode::Submit));
        }
        self.sync_editor_errors();

        if self.session.has_errors() {
            self.session.finish_submit();
            let errors = self.session.errors();
            warn!(errors = errors.len(), "submit blocked");
            events.push(FormEvent::SubmitBlocked { errors });
            return events;
        }
        debug!(documents = self.session.len(), "submitted");
        events.push(FormEvent::Submitted {
            documents: self.session.documents().to_vec(),
        });
        events
    }

    /// The host's submit handler finished.
    pub fn finish_submit(&mut self) {
        self.session.finish_submit();
    }

    // -----------------------------------------------------------------------
    // Asynchronous results
    // -----------------------------------------------------------------------

    fn is_current_epoch(&self, ticket: Ticket) -> bool {
        if ticket.epoch == self.session.epoch() {
            return true;
        }
        debug!(
            ticket_epoch = ticket.epoch,
            epoch = self.session.epoch(),
            "dropping result from a previous mount"
        );
        false
    }

    /// One document's answer to a [`ValidationRequest`].
    pub fn resolve_validation(&mut self, ticket: Ticket, doc_index: usize, error: Option<String>) -> Vec<FormEvent> {
        if !self.is_current_epoch(ticket) {
            return Vec::new();
        }
        let Some((path, round)) = self
            .rounds
            .iter_mut()
            .find(|(_, round)| round.generation == ticket.generation)
        else {
            debug!(generation = ticket.generation, "dropping superseded validation result");
            return Vec::new();
        };
        let Some(slot) = round.answers.get_mut(doc_index) else {
            warn!(path = %path, doc_index, "validation result for a document outside the batch");
            return Vec::new();
        };
        *slot = Some(error);
        if round.answers.iter().any(Option::is_none) {
            return Vec::new();
        }

        let path = path.clone();
        let Some(round) = self.rounds.shift_remove(&path) else {
            return Vec::new();
        };
        let error = round.answers.into_iter().flatten().flatten().next();
        debug!(path = %path, failed = error.is_some(), "validation round complete");
        let events = self.session.set_async_error(&path, error);
        self.sync_editor_errors();
        events
    }

    pub fn resolve_upload(
        &mut self,
        path: &PropertyPath,
        ticket: Ticket,
        result: Result<FileReference, ResourceError>,
    ) -> Result<Vec<FormEvent>, EngineError> {
        if !self.is_current_epoch(ticket) {
            return Ok(Vec::new());
        }
        let editor =
            find_editor_mut(&mut self.nodes, path).ok_or_else(|| EngineError::UnknownProperty(path.clone()))?;
        let result = editor.resolve_upload(ticket.generation, result);
        self.process(path, result)
    }

    pub fn resolve_delete(
        &mut self,
        path: &PropertyPath,
        ticket: Ticket,
        result: Result<(), ResourceError>,
    ) -> Result<Vec<FormEvent>, EngineError> {
        if !self.is_current_epoch(ticket) {
            return Ok(Vec::new());
        }
        let editor =
            find_editor_mut(&mut self.nodes, path).ok_or_else(|| EngineError::UnknownProperty(path.clone()))?;
        let result = editor.resolve_delete(ticket.generation, result);
        self.process(path, result)
    }

    // -----------------------------------------------------------------------
    // Remount
    // -----------------------------------------------------------------------

    /// The caller supplied new input documents. In-flight requests become
    /// stale and editors follow the new values.
    pub fn replace_documents(&mut self, documents: Vec<Document>) -> Result<Vec<FormEvent>, EngineError> {
        let mut events = self.session.replace_documents(documents, self.resolver.as_ref())?;
        self.rounds.clear();
        events.extend(self.refresh_layout()?);
        self.reconcile_editors();
        for path in self.session.error_paths() {
            events.extend(self.revalidate(&path, ValidationMode::Live));
        }
        self.sync_editor_errors();
        Ok(events)
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    /// The open dialog covers the whole form.
    pub fn draw(&self, width: u16) -> DrawOutput {
        let ctx = RenderContext::new(self.context.theme.clone(), width);
        match &self.dialog {
            Some(dialog) => dialog.bridge.draw(&ctx),
            None => draw_nodes(&self.nodes, &ctx, 0),
        }
    }
}

impl std::fmt::Debug for PropertyForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyForm")
            .field("session", &self.session)
            .field("paths", &self.paths)
            .field("pending_validations", &self.rounds.len())
            .finish_non_exhaustive()
    }
}

/// Every group prefix on the way to each path, outermost first.
fn group_prefixes(paths: &[PropertyPath]) -> Vec<PropertyPath> {
    let mut out: IndexSet<PropertyPath> = IndexSet::new();
    for path in paths {
        let raw = path.as_str();
        for (index, _) in raw.match_indices(SEPARATOR) {
            out.insert(PropertyPath::new(&raw[..=index]));
        }
    }
    out.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::{FormContext, FormOptions, PropertyForm, group_prefixes};
    use crate::core::document::Document;
    use crate::core::error::EngineError;
    use crate::core::property_path::PropertyPath;
    use crate::core::value::Value;
    use crate::inspector::InspectorRegistry;
    use crate::runtime::Instant;
    use crate::runtime::event::FormEvent;
    use crate::widgets::traits::FieldInput;

    fn project(title: &str) -> Document {
        Document::new().with("kind", "project").with("title", title)
    }

    fn mount(documents: Vec<Document>, options: FormOptions) -> PropertyForm {
        let registry = InspectorRegistry::builtin().expect("registry");
        PropertyForm::mount(documents, registry, options, FormContext::default()).expect("mount")
    }

    #[test]
    fn group_prefixes_cover_every_level() {
        let prefixes = group_prefixes(&[PropertyPath::from("a/b/c"), PropertyPath::from("a/d")]);
        assert_eq!(prefixes, vec![PropertyPath::from("a/"), PropertyPath::from("a/b/")]);
    }

    #[test]
    fn derived_layout_follows_visibility() {
        let mut form = mount(vec![project("Orbit")], FormOptions::default());
        assert!(!form.paths().iter().any(|path| path.as_str().starts_with("pitch/")));

        let events = form
            .handle(&PropertyPath::from("public"), FieldInput::Toggle, Instant::now())
            .expect("toggle");
        assert!(events.contains(&FormEvent::Changed {
            path: PropertyPath::from("public"),
            value: Value::Bool(true),
        }));
        assert!(form.paths().iter().any(|path| path == "pitch/audience"));
    }

    #[test]
    fn unknown_path_is_a_contract_error() {
        let mut form = mount(vec![project("Orbit")], FormOptions::default());
        assert!(matches!(
            form.handle(&PropertyPath::from("nope"), FieldInput::Focus, Instant::now()),
            Err(EngineError::UnknownProperty(_))
        ));
    }

    #[test]
    fn fixed_layout_is_respected() {
        let form = mount(
            vec![project("Orbit")],
            FormOptions::default().with_property_paths(["title", "players/max"]),
        );
        assert_eq!(form.paths().len(), 2);
        assert!(form.editor(&PropertyPath::from("title")).is_some());
        assert!(form.editor(&PropertyPath::from("summary")).is_none());
    }

    #[test]
    fn toggling_a_group_builds_its_editors() {
        let mut form = mount(vec![project("Orbit")], FormOptions::default());
        let max = PropertyPath::from("players/max");
        assert!(form.editor(&max).is_none());
        let events = form.toggle_group(&PropertyPath::from("players/")).expect("toggle");
        assert_eq!(
            events,
            vec![FormEvent::ExpandProperty {
                path: PropertyPath::from("players/"),
                expanded: true,
            }]
        );
        assert_eq!(form.editor(&max).expect("built").value(), Value::Number(4.0));
        assert!(form.draw(60).to_plain_text().contains("▾"));
    }
}
