use crate::core::document::Document;
use crate::core::property_path::PropertyPath;
use crate::core::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Identifies one asynchronous round trip.
///
/// `epoch` changes whenever the form is remounted with new documents;
/// `generation` changes whenever the owning field starts a newer round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub epoch: u64,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRequest {
    pub ticket: Ticket,
    pub path: PropertyPath,
    pub doc_index: usize,
    pub value: Value,
    /// Working copy of the document at the time of the request.
    pub document: Document,
}

/// A file picked on the client, not yet stored remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub size: u64,
    pub mime: Option<String>,
    /// Blob URL used for the optimistic preview.
    pub blob_url: String,
}

/// A stored binary as referenced from a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    pub storage_key: String,
    pub url: String,
    pub name: String,
    pub size: u64,
}

impl FileReference {
    pub fn to_value(&self) -> Value {
        Value::Object(IndexMap::from([
            ("storage_key".to_string(), Value::Text(self.storage_key.clone())),
            ("url".to_string(), Value::Text(self.url.clone())),
            ("name".to_string(), Value::Text(self.name.clone())),
            ("size".to_string(), Value::Number(self.size as f64)),
        ]))
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let text = |key: &str| map.get(key).and_then(Value::as_text).map(str::to_string);
        Some(Self {
            storage_key: text("storage_key")?,
            url: text("url")?,
            name: text("name").unwrap_or_default(),
            size: map
                .get("size")
                .and_then(Value::as_number)
                .map_or(0, |size| size.max(0.0) as u64),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub ticket: Ticket,
    pub path: PropertyPath,
    pub file: LocalFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub ticket: Ticket,
    pub path: PropertyPath,
    pub storage_key: String,
}
