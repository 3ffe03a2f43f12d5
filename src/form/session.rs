use crate::core::document::Document;
use crate::core::error::EngineError;
use crate::core::property_path::PropertyPath;
use crate::core::value::Value;
use crate::inspector::{DocContext, Inspector, InspectorResolver};
use crate::runtime::event::FormEvent;
use crate::widgets::validators::{field_validators, run_validators};
use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;
use tracing::debug;

/// Mutable state of one mounted form: working copies of the batch, the
/// layered error map and group expansion.
pub struct EditSession {
    inspectors: Vec<Arc<dyn Inspector>>,
    baseline: Vec<Document>,
    working: Vec<Document>,
    sync_errors: IndexMap<PropertyPath, String>,
    async_errors: IndexMap<PropertyPath, String>,
    expanded: IndexSet<PropertyPath>,
    submitting: bool,
    epoch: u64,
}

impl EditSession {
    /// Merges every document onto its inspector's default.
    pub fn mount(documents: Vec<Document>, resolver: &dyn InspectorResolver) -> Result<Self, EngineError> {
        let (inspectors, working) = prepare(documents, resolver)?;
        debug!(documents = working.len(), "edit session mounted");
        Ok(Self {
            inspectors,
            baseline: working.clone(),
            working,
            sync_errors: IndexMap::new(),
            async_errors: IndexMap::new(),
            expanded: IndexSet::new(),
            submitting: false,
            epoch: 0,
        })
    }

    /// New input documents from the caller. Unsaved edits are dropped and
    /// every in-flight request becomes stale.
    pub fn replace_documents(
        &mut self,
        documents: Vec<Document>,
        resolver: &dyn InspectorResolver,
    ) -> Result<Vec<FormEvent>, EngineError> {
        let (inspectors, working) = prepare(documents, resolver)?;
        self.inspectors = inspectors;
        self.baseline = working.clone();
        self.working = working;
        self.epoch += 1;
        self.submitting = false;
        debug!(epoch = self.epoch, documents = self.working.len(), "edit session replaced");

        let stale: Vec<PropertyPath> = self.async_errors.keys().cloned().collect();
        let mut events = Vec::new();
        for path in stale {
            events.extend(self.set_async_error(&path, None));
        }
        Ok(events)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.working.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.working
    }

    pub fn baseline(&self) -> &[Document] {
        &self.baseline
    }

    /// First document of the batch; layout and labels come from it.
    pub fn primary(&self) -> &Document {
        &self.working[0]
    }

    pub fn primary_inspector(&self) -> &Arc<dyn Inspector> {
        &self.inspectors[0]
    }

    pub fn inspector(&self, index: usize) -> Option<&Arc<dyn Inspector>> {
        self.inspectors.get(index)
    }

    pub fn value(&self, path: &PropertyPath) -> Value {
        self.primary().get(path).cloned().unwrap_or_default()
    }

    /// Writes `value` at `path` in every working copy, normalizing each with
    /// its own inspector. Returns the normalized value of the first copy.
    pub fn apply(&mut self, path: &PropertyPath, value: Value) -> Value {
        let next: Vec<Document> = self
            .working
            .iter()
            .zip(&self.inspectors)
            .map(|(document, inspector)| {
                let mut document = document.clone();
                document.set(path, value.clone());
                inspector.normalize(document)
            })
            .collect();
        self.working = next;
        self.value(path)
    }

    /// First non-null error for `path` across the batch: the inspector's
    /// verdict, then the rules the field spec carries.
    pub fn compute_error(&self, path: &PropertyPath) -> Option<String> {
        self.working
            .iter()
            .zip(&self.inspectors)
            .enumerate()
            .find_map(|(index, (document, inspector))| {
                inspector
                    .error_of(path, document, &DocContext::new(index, &self.working))
                    .or_else(|| field_rule_error(inspector.as_ref(), path, document))
            })
    }

    /// Visible error: synchronous first, then asynchronous.
    pub fn error(&self, path: &PropertyPath) -> Option<&str> {
        self.sync_errors
            .get(path)
            .or_else(|| self.async_errors.get(path))
            .map(String::as_str)
    }

    pub fn errors(&self) -> IndexMap<PropertyPath, String> {
        let mut out = self.sync_errors.clone();
        for (path, error) in &self.async_errors {
            out.entry(path.clone()).or_insert_with(|| error.clone());
        }
        out
    }

    pub fn has_errors(&self) -> bool {
        !self.sync_errors.is_empty() || !self.async_errors.is_empty()
    }

    /// Paths currently carrying any error.
    pub fn error_paths(&self) -> Vec<PropertyPath> {
        self.errors().into_keys().collect()
    }

    pub fn set_sync_error(&mut self, path: &PropertyPath, error: Option<String>) -> Vec<FormEvent> {
        let before = self.error(path).map(str::to_string);
        match error {
            Some(error) => {
                self.sync_errors.insert(path.clone(), error);
            }
            None => {
                self.sync_errors.shift_remove(path);
            }
        }
        self.transition(path, before)
    }

    pub fn set_async_error(&mut self, path: &PropertyPath, error: Option<String>) -> Vec<FormEvent> {
        let before = self.error(path).map(str::to_string);
        match error {
            Some(error) => {
                self.async_errors.insert(path.clone(), error);
            }
            None => {
                self.async_errors.shift_remove(path);
            }
        }
        self.transition(path, before)
    }

    fn transition(&self, path: &PropertyPath, before: Option<String>) -> Vec<FormEvent> {
        let after = self.error(path);
        match (before.as_deref(), after) {
            (before, Some(after)) if before != Some(after) => vec![FormEvent::PropertyErrorFound {
                path: path.clone(),
                error: after.to_string(),
            }],
            (Some(_), None) => vec![FormEvent::PropertyErrorFixed { path: path.clone() }],
            _ => Vec::new(),
        }
    }

    pub fn is_expanded(&self, path: &PropertyPath) -> bool {
        self.expanded.contains(path)
    }

    pub fn set_expanded(&mut self, path: &PropertyPath, expanded: bool) {
        if expanded {
            self.expanded.insert(path.clone());
        } else {
            self.expanded.shift_remove(path);
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Returns false if a submission is already in progress.
    pub fn begin_submit(&mut self) -> bool {
        if self.submitting {
            return false;
        }
        self.submitting = true;
        true
    }

    pub fn finish_submit(&mut self) {
        self.submitting = false;
    }

    pub fn is_dirty(&self) -> bool {
        self.working != self.baseline
    }

    /// Leaf paths whose value differs from the mounted baseline in any
    /// document of the batch.
    pub fn changed_paths(&self) -> Vec<PropertyPath> {
        let mut candidates: IndexSet<PropertyPath> = IndexSet::new();
        for document in self.working.iter().chain(&self.baseline) {
            candidates.extend(document.leaf_paths());
        }
        candidates
            .into_iter()
            .filter(|path| {
                self.working
                    .iter()
                    .zip(&self.baseline)
                    .any(|(working, baseline)| working.get(path) != baseline.get(path))
            })
            .collect()
    }
}

fn prepare(
    documents: Vec<Document>,
    resolver: &dyn InspectorResolver,
) -> Result<(Vec<Arc<dyn Inspector>>, Vec<Document>), EngineError> {
    if documents.is_empty() {
        return Err(EngineError::EmptyBatch);
    }
    let mut inspectors = Vec::with_capacity(documents.len());
    let mut working = Vec::with_capacity(documents.len());
    for document in documents {
        let inspector = resolver.inspector_for(&document)?;
        let merged = document.merged_onto(&inspector.create_default());
        working.push(inspector.normalize(merged));
        inspectors.push(inspector);
    }
    Ok((inspectors, working))
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("documents", &self.working.len())
            .field("epoch", &self.epoch)
            .field("errors", &self.errors())
            .field("submitting", &self.submitting)
            .finish_non_exhaustive()
    }
}

/// The field spec's own rules, checked against one document's value.
fn field_rule_error(inspector: &dyn Inspector, path: &PropertyPath, document: &Document) -> Option<String> {
    let validators = field_validators(&inspector.field_spec(path, document));
    if validators.is_empty() {
        return None;
    }
    let value = document.get(path).cloned().unwrap_or_default();
    run_validators(&validators, &value).err()
}

#[cfg(test)]
mod tests {
    use super::EditSession;
    use crate::core::document::Document;
    use crate::core::error::EngineError;
    use crate::core::property_path::PropertyPath;
    use crate::core::value::Value;
    use crate::inspector::InspectorRegistry;
    use crate::runtime::event::FormEvent;
use crate::widgets::validators::{field_validators, run_validators};

    fn registry() -> InspectorRegistry {
        InspectorRegistry::builtin().expect("builtin registry")
    }

    fn project(title: &str) -> Document {
        Document::new().with("kind", "project").with("title", title)
    }

    #[test]
    fn empty_batch_is_rejected() {
        assert!(matches!(
            EditSession::mount(Vec::new(), &registry()),
            Err(EngineError::EmptyBatch)
        ));
    }

    #[test]
    fn partial_documents_gain_defaults() {
        let session = EditSession::mount(vec![project("Orbit")], &registry()).expect("mount");
        let doc = session.primary();
        assert_eq!(doc.get(&PropertyPath::from("players/max")), Some(&Value::Number(4.0)));
        assert_eq!(doc.get(&PropertyPath::from("title")), Some(&Value::from("Orbit")));
        assert!(!session.is_dirty());
    }

    #[test]
    fn apply_updates_every_copy_with_normalization() {
        let mut session =
            EditSession::mount(vec![project("A"), project("B"), project("C")], &registry()).expect("mount");
        let path = PropertyPath::from("players/max");
        let value = session.apply(&path, Value::Number(99.0));
        assert_eq!(value, Value::Number(64.0));
        assert!(session.documents().iter().all(|doc| doc.get(&path) == Some(&Value::Number(64.0))));
        assert_eq!(session.changed_paths(), vec![path]);
    }

    #[test]
    fn error_transitions_fire_once() {
        let mut session = EditSession::mount(vec![project("")], &registry()).expect("mount");
        let path = PropertyPath::from("title");
        let error = session.compute_error(&path);
        assert_eq!(error.as_deref(), Some("Title is required"));

        let found = session.set_sync_error(&path, error.clone());
        assert!(matches!(found.as_slice(), [FormEvent::PropertyErrorFound { .. }]));
        assert!(session.set_sync_error(&path, error).is_empty());
        assert!(session.set_async_error(&path, Some("taken".to_string())).is_empty());

        let switched = session.set_sync_error(&path, None);
        assert!(matches!(
            switched.as_slice(),
            [FormEvent::PropertyErrorFound { error, .. }] if error == "taken"
        ));
        assert_eq!(session.error(&path), Some("taken"));
        let fixed = session.set_async_error(&path, None);
        assert!(matches!(fixed.as_slice(), [FormEvent::PropertyErrorFixed { .. }]));
    }

    #[test]
    fn replace_bumps_epoch_and_clears_async_errors() {
        let mut session = EditSession::mount(vec![project("A")], &registry()).expect("mount");
        let path = PropertyPath::from("title");
        session.set_async_error(&path, Some("taken".to_string()));
        let events = session
            .replace_documents(vec![project("B")], &registry())
            .expect("replace");
        assert_eq!(session.epoch(), 1);
        assert!(matches!(events.as_slice(), [FormEvent::PropertyErrorFixed { .. }]));
        assert_eq!(session.value(&path), Value::from("B"));
    }

    #[test]
    fn submit_guard_rejects_reentry() {
        let mut session = EditSession::mount(vec![project("A")], &registry()).expect("mount");
        assert!(session.begin_submit());
        assert!(!session.begin_submit());
        session.finish_submit();
        assert!(session.begin_submit());
    }
}
