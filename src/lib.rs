pub mod config;
pub mod core;
pub mod form;
pub mod inspector;
pub mod runtime;
pub mod ui;
pub mod widgets;

pub use config::EngineConfig;

pub use core::document;
pub use core::error;
pub use core::property_path;
pub use core::value;
pub use core::{ConfigError, Document, EngineError, PropertyPath, ResourceError, Value};

pub use form::{EditSession, FormContext, FormOptions, GroupRenderer, PropertyForm};

pub use inspector::{
    DocContext, DocumentKind, FieldSpec, Inspector, InspectorRegistry, InspectorResolver, NumberBounds,
    SchemaInspector,
};

pub use runtime::{
    FieldAction, FormEvent, Instant, Notice, NoticeLevel, NoticeQueue, Notifier, SilentNotifier, Ticket,
};

pub use ui::span;
pub use ui::style;
pub use ui::theme;

pub use widgets::inputs::{
    AutocompleteEditor, BooleanEditor, FileEditor, NumberEditor, PreDeleteHook, ReferenceEditor,
    ReferenceTarget, TextEditor,
};
pub use widgets::{ClosePolicy, DialogBridge, DialogPhase, FieldEditor, FieldInput, KeyboardInset};
