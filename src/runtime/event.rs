use crate::core::document::Document;
use crate::core::property_path::PropertyPath;
use crate::core::value::Value;
use crate::runtime::notice::Notice;
use crate::runtime::request::{DeleteRequest, LocalFile, UploadRequest, ValidationRequest};
use indexmap::IndexMap;

/// Actions emitted by field editors in an `InteractionResult`.
/// These flow upward from an editor to the form that owns it.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldAction {
    /// Live, possibly invalid input. Never persisted.
    InputChanged(Value),
    /// Commit tier: the form normalizes and merges this value.
    Changed(Value),
    /// Settle tier: input has been quiet for the debounce interval.
    DebouncedChanged(Value),
    Blurred,
    /// Input hit the character ceiling.
    LimitReached,
    /// An injected action pseudo-option was chosen.
    OptionAction(String),
    UploadRequested { generation: u64, file: LocalFile },
    DeleteRequested { generation: u64, storage_key: String },
    Notice(Notice),
}

/// Events a form hands back to its host, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    InputChanged {
        path: PropertyPath,
        value: Value,
    },
    Changed {
        path: PropertyPath,
        value: Value,
    },
    DebouncedChanged {
        path: PropertyPath,
        value: Value,
    },
    Blurred {
        path: PropertyPath,
    },
    LimitReached {
        path: PropertyPath,
    },
    OptionAction {
        path: PropertyPath,
        action: String,
    },
    PropertyErrorFound {
        path: PropertyPath,
        error: String,
    },
    PropertyErrorFixed {
        path: PropertyPath,
    },
    ExpandProperty {
        path: PropertyPath,
        expanded: bool,
    },
    DialogOpened {
        path: PropertyPath,
    },
    DialogClosed {
        path: PropertyPath,
        saved: bool,
    },
    ValidationRequested(ValidationRequest),
    UploadRequested(UploadRequest),
    DeleteRequested(DeleteRequest),
    Submitted {
        documents: Vec<Document>,
    },
    SubmitBlocked {
        errors: IndexMap<PropertyPath, String>,
    },
}

impl FormEvent {
    pub fn path(&self) -> Option<&PropertyPath> {
        match self {
            Self::InputChanged { path, .. }
            | Self::Changed { path, .. }
            | Self::DebouncedChanged { path, .. }
            | Self::Blurred { path }
            | Self::LimitReached { path }
            | Self::OptionAction { path, .. }
            | Self::PropertyErrorFound { path, .. }
            | Self::PropertyErrorFixed { path }
            | Self::ExpandProperty { path, .. }
            | Self::DialogOpened { path }
            | Self::DialogClosed { path, .. } => Some(path),
            Self::ValidationRequested(request) => Some(&request.path),
            Self::UploadRequested(request) => Some(&request.path),
            Self::DeleteRequested(request) => Some(&request.path),
            Self::Submitted { .. } | Self::SubmitBlocked { .. } => None,
        }
    }
}
