//! Per-document-kind capability objects that describe how to enumerate,
//! order, default, normalize and validate a document's properties.

pub mod builtin;
pub mod field;
pub mod normalize;
pub mod schema;

use crate::core::document::Document;
use crate::core::error::EngineError;
use crate::core::property_path::{PropertyPath, check_tree_shape};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use field::{FieldSpec, FileSpec, OptionSpec, TagSpec, TextSpec};
pub use normalize::{Casing, NumberBounds, TextRules};
pub use schema::{InspectorSchema, SchemaInspector};

/// Where a document sits in the batch being edited.
#[derive(Debug, Clone, Copy)]
pub struct DocContext<'a> {
    pub index: usize,
    pub batch: &'a [Document],
}

impl<'a> DocContext<'a> {
    pub fn new(index: usize, batch: &'a [Document]) -> Self {
        Self { index, batch }
    }

    /// The other documents of the batch, for cross-document rules.
    pub fn siblings(&self) -> impl Iterator<Item = &'a Document> + '_ {
        self.batch
            .iter()
            .enumerate()
            .filter(move |(idx, _)| *idx != self.index)
            .map(|(_, doc)| doc)
    }
}

/// Stateless description of one document kind.
pub trait Inspector: Send + Sync {
    fn create_default(&self) -> Document;

    /// Visible property paths in discovery order.
    fn list_visible_properties(&self, document: &Document) -> Vec<PropertyPath>;

    fn order_of(&self, _path: &PropertyPath, _document: &Document) -> i32 {
        0
    }

    /// Synchronous normalization run on every commit.
    fn normalize(&self, document: Document) -> Document {
        document
    }

    fn error_of(
        &self,
        path: &PropertyPath,
        document: &Document,
        ctx: &DocContext<'_>,
    ) -> Option<String>;

    fn name(&self, document: &Document) -> String;

    fn label_of(&self, path: &PropertyPath) -> String {
        path.leaf_name().to_string()
    }

    fn field_spec(&self, path: &PropertyPath, document: &Document) -> FieldSpec {
        FieldSpec::infer_for(path, document)
    }

    /// Every path this kind can ever list; checked once at registration.
    fn declared_properties(&self) -> Vec<PropertyPath> {
        self.list_visible_properties(&self.create_default())
    }
}

/// Closed set of document kinds the platform edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Account,
    Project,
    File,
    Member,
    Report,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 5] = [
        DocumentKind::Account,
        DocumentKind::Project,
        DocumentKind::File,
        DocumentKind::Member,
        DocumentKind::Report,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Project => "project",
            Self::File => "file",
            Self::Member => "member",
            Self::Report => "report",
        }
    }

    /// Reads the explicit discriminator field of `document`.
    pub fn of(document: &Document) -> Result<Self, EngineError> {
        let tag = document
            .kind_tag()
            .ok_or(EngineError::MissingDiscriminator {
                field: crate::core::document::KIND_FIELD,
            })?;
        tag.parse()
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| EngineError::UnknownDocumentKind(value.to_string()))
    }
}

/// One inspector per [`DocumentKind`], selected by discriminator.
#[derive(Clone)]
pub struct InspectorRegistry {
    account: Arc<dyn Inspector>,
    project: Arc<dyn Inspector>,
    file: Arc<dyn Inspector>,
    member: Arc<dyn Inspector>,
    report: Arc<dyn Inspector>,
}

impl InspectorRegistry {
    pub fn new(
        account: Arc<dyn Inspector>,
        project: Arc<dyn Inspector>,
        file: Arc<dyn Inspector>,
        member: Arc<dyn Inspector>,
        report: Arc<dyn Inspector>,
    ) -> Result<Self, EngineError> {
        let registry = Self {
            account,
            project,
            file,
            member,
            report,
        };
        for kind in DocumentKind::ALL {
            check_inspector(kind, registry.get(kind).as_ref())?;
        }
        Ok(registry)
    }

    /// Registry backed by the built-in schemas.
    pub fn builtin() -> Result<Self, EngineError> {
        let load = |kind| -> Result<Arc<dyn Inspector>, EngineError> {
            Ok(Arc::new(builtin::schema_inspector(kind)?))
        };
        Self::new(
            load(DocumentKind::Account)?,
            load(DocumentKind::Project)?,
            load(DocumentKind::File)?,
            load(DocumentKind::Member)?,
            load(DocumentKind::Report)?,
        )
    }

    pub fn get(&self, kind: DocumentKind) -> &Arc<dyn Inspector> {
        match kind {
            DocumentKind::Account => &self.account,
            DocumentKind::Project => &self.project,
            DocumentKind::File => &self.file,
            DocumentKind::Member => &self.member,
            DocumentKind::Report => &self.report,
        }
    }

    /// Swaps the inspector for one kind, re-running the registration check.
    pub fn with(mut self, kind: DocumentKind, inspector: Arc<dyn Inspector>) -> Result<Self, EngineError> {
        check_inspector(kind, inspector.as_ref())?;
        let slot = match kind {
            DocumentKind::Account => &mut self.account,
            DocumentKind::Project => &mut self.project,
            DocumentKind::File => &mut self.file,
            DocumentKind::Member => &mut self.member,
            DocumentKind::Report => &mut self.report,
        };
        *slot = inspector;
        Ok(self)
    }
}

impl fmt::Debug for InspectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InspectorRegistry").finish_non_exhaustive()
    }
}

/// Registration-time precondition: property paths must form an acyclic tree.
fn check_inspector(kind: DocumentKind, inspector: &dyn Inspector) -> Result<(), EngineError> {
    check_tree_shape(&inspector.declared_properties()).map_err(|issue| {
        EngineError::InvalidSchema {
            kind: kind.to_string(),
            reason: issue.to_string(),
        }
    })
}

/// Picks the inspector for each document of a batch.
pub trait InspectorResolver {
    fn inspector_for(&self, document: &Document) -> Result<Arc<dyn Inspector>, EngineError>;
}

impl InspectorResolver for InspectorRegistry {
    fn inspector_for(&self, document: &Document) -> Result<Arc<dyn Inspector>, EngineError> {
        let kind = DocumentKind::of(document)?;
        Ok(Arc::clone(self.get(kind)))
    }
}

/// A single inspector for every document.
impl InspectorResolver for Arc<dyn Inspector> {
    fn inspector_for(&self, _document: &Document) -> Result<Arc<dyn Inspector>, EngineError> {
        Ok(Arc::clone(self))
    }
}

#[cfg(test)]
mod tests {
    use super::{DocumentKind, InspectorRegistry, InspectorResolver};
    use crate::core::document::Document;
    use crate::core::error::EngineError;

    #[test]
    fn registry_dispatches_on_discriminator() {
        let registry = InspectorRegistry::builtin().expect("builtin registry");
        let doc = Document::new().with("kind", "project").with("title", "Orbit");
        let inspector = registry.inspector_for(&doc).expect("inspector");
        assert_eq!(inspector.name(&doc), "Orbit");
    }

    #[test]
    fn missing_or_unknown_discriminator_is_an_error() {
        let registry = InspectorRegistry::builtin().expect("builtin registry");
        assert!(matches!(
            registry.inspector_for(&Document::new()),
            Err(EngineError::MissingDiscriminator { .. })
        ));
        assert!(matches!(
            registry.inspector_for(&Document::new().with("kind", "spaceship")),
            Err(EngineError::UnknownDocumentKind(_))
        ));
    }

    #[test]
    fn kind_round_trips_through_str() {
        for kind in DocumentKind::ALL {
            assert_eq!(kind.as_str().parse::<DocumentKind>().ok(), Some(kind));
        }
    }
}
