pub mod document;
pub mod error;
pub mod property_path;
pub mod search;
pub mod value;

pub use document::Document;
pub use error::{ConfigError, EngineError, ResourceError};
pub use property_path::PropertyPath;
pub use value::Value;
