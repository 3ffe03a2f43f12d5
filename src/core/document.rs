use crate::core::property_path::PropertyPath;
use crate::core::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Field carrying the document kind discriminator.
pub const KIND_FIELD: &str = "kind";

/// An editable record: ordered property name -> value, with nested objects
/// addressed through `/`-separated property paths.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: IndexMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: IndexMap<String, Value>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> IndexMap<String, Value> {
        self.fields
    }

    pub fn with(mut self, path: impl Into<PropertyPath>, value: impl Into<Value>) -> Self {
        self.set(&path.into(), value.into());
        self
    }

    pub fn kind_tag(&self) -> Option<&str> {
        self.fields.get(KIND_FIELD).and_then(Value::as_text)
    }

    /// Value at `path`. A group marker returns the nested object itself.
    pub fn get(&self, path: &PropertyPath) -> Option<&Value> {
        let segments = path.segments();
        let (first, rest) = segments.split_first()?;
        let mut current = self.fields.get(*first)?;
        for segment in rest {
            current = current.as_object()?.get(*segment)?;
        }
        Some(current)
    }

    /// Writes `value` at `path`, creating (or replacing non-object)
    /// intermediate containers.
    pub fn set(&mut self, path: &PropertyPath, value: Value) {
        let segments = path.segments();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut map = &mut self.fields;
        for segment in parents {
            let slot = map
                .entry((*segment).to_string())
                .or_insert_with(|| Value::Object(IndexMap::new()));
            if !matches!(slot, Value::Object(_)) {
                *slot = Value::Object(IndexMap::new());
            }
            let Value::Object(next) = slot else {
                return;
            };
            map = next;
        }
        map.insert((*last).to_string(), value);
    }

    /// The nested object addressed by a group prefix, as its own document.
    pub fn slice(&self, prefix: &PropertyPath) -> Document {
        match self.get(prefix) {
            Some(Value::Object(map)) => Document::from_fields(map.clone()),
            _ => Document::new(),
        }
    }

    /// Deep-merges `self` onto `defaults`, so every default path is present.
    pub fn merged_onto(self, defaults: &Document) -> Document {
        let mut base = Value::Object(defaults.fields.clone());
        base.merge(Value::Object(self.fields));
        match base {
            Value::Object(fields) => Document::from_fields(fields),
            _ => Document::new(),
        }
    }

    /// Every scalar (non-object) path, depth first in insertion order.
    pub fn leaf_paths(&self) -> Vec<PropertyPath> {
        let mut out = Vec::new();
        collect_leaves(&self.fields, "", &mut out);
        out
    }

    /// True when every leaf path of `shape` exists in `self`.
    pub fn covers(&self, shape: &Document) -> bool {
        shape
            .leaf_paths()
            .iter()
            .all(|path| self.get(path).is_some())
    }
}

fn collect_leaves(map: &IndexMap<String, Value>, prefix: &str, out: &mut Vec<PropertyPath>) {
    for (key, value) in map {
        let path = format!("{prefix}{key}");
        match value {
            Value::Object(nested) if !nested.is_empty() => {
                collect_leaves(nested, format!("{path}/").as_str(), out);
            }
            _ => out.push(PropertyPath::new(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Document;
    use crate::core::property_path::PropertyPath;
    use crate::core::value::Value;

    #[test]
    fn set_creates_nested_objects() {
        let mut doc = Document::new();
        doc.set(&PropertyPath::from("stats/max"), Value::Number(4.0));
        assert_eq!(
            doc.get(&PropertyPath::from("stats/max")),
            Some(&Value::Number(4.0))
        );
        assert!(doc.get(&PropertyPath::from("stats/")).is_some_and(|v| v.as_object().is_some()));
    }

    #[test]
    fn merged_onto_defaults_fills_missing_fields() {
        let defaults = Document::new()
            .with("title", "")
            .with("stats/max", 10.0)
            .with("stats/min", 0.0);
        let partial = Document::new().with("stats/max", 3.0);

        let merged = partial.merged_onto(&defaults);
        assert!(merged.covers(&defaults));
        assert_eq!(merged.get(&PropertyPath::from("stats/max")), Some(&Value::Number(3.0)));
        assert_eq!(merged.get(&PropertyPath::from("stats/min")), Some(&Value::Number(0.0)));
    }

    #[test]
    fn slice_returns_nested_document() {
        let doc = Document::new().with("stats/max", 3.0).with("title", "x");
        let slice = doc.slice(&PropertyPath::from("stats/"));
        assert_eq!(slice.get(&PropertyPath::from("max")), Some(&Value::Number(3.0)));
        assert!(doc.slice(&PropertyPath::from("title/")).fields().is_empty());
    }

    #[test]
    fn leaf_paths_walk_depth_first() {
        let doc = Document::new().with("a/x", 1.0).with("a/y", 2.0).with("b", true);
        let leaves: Vec<String> = doc.leaf_paths().into_iter().map(PropertyPath::into_inner).collect();
        assert_eq!(leaves, vec!["a/x", "a/y", "b"]);
    }
}
