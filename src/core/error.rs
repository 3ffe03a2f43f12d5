use crate::core::property_path::PropertyPath;
use thiserror::Error;

/// Contract errors: the caller handed the engine something it cannot edit.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cannot edit an empty batch of documents")]
    EmptyBatch,
    #[error("document has no '{field}' discriminator")]
    MissingDiscriminator { field: &'static str },
    #[error("unknown document kind '{0}'")]
    UnknownDocumentKind(String),
    #[error("no field is mounted at '{0}'")]
    UnknownProperty(PropertyPath),
    #[error("invalid inspector schema for {kind}: {reason}")]
    InvalidSchema { kind: String, reason: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to parse json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid accept glob '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

/// Failure reported by an upload/delete collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ResourceError {
    pub message: String,
}

impl ResourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
