use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A property value inside a [`Document`](crate::core::document::Document).
///
/// Serializes untagged so documents round-trip through plain JSON/YAML.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Value {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::Text(v) => v.is_empty(),
            Self::List(v) => v.is_empty(),
            Self::Object(v) => v.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut IndexMap<String, Value>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Scalar rendering used by text-like editors.
    pub fn to_text_scalar(&self) -> Option<String> {
        match self {
            Self::None => Some(String::new()),
            Self::Text(text) => Some(text.clone()),
            Self::Bool(flag) => Some(flag.to_string()),
            Self::Number(number) => Some(format_number(*number)),
            Self::List(_) | Self::Object(_) => None,
        }
    }

    pub fn to_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Text(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Self::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            Self::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" | "" => Some(false),
                _ => None,
            },
            Self::Number(number) => Some(*number != 0.0),
            Self::None => Some(false),
            _ => None,
        }
    }

    /// List of text items, the representation tag editors commit.
    pub fn to_text_list(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.iter().filter_map(Value::to_text_scalar).collect(),
            Self::None => Vec::new(),
            other => other
                .to_text_scalar()
                .filter(|text| !text.is_empty())
                .into_iter()
                .collect(),
        }
    }

    /// Deep merge: objects merge key by key, anything else in `overlay`
    /// replaces `self`.
    pub fn merge(&mut self, overlay: Value) {
        match (self, overlay) {
            (Self::Object(base), Self::Object(overlay)) => {
                for (key, value) in overlay {
                    match base.get_mut(&key) {
                        Some(existing) => existing.merge(value),
                        None => {
                            base.insert(key, value);
                        }
                    }
                }
            }
            (slot, overlay) => *slot = overlay,
        }
    }
}

pub fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        format!("{number}")
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Self::List(value.into_iter().map(Value::Text).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::None,
            serde_json::Value::Bool(flag) => Self::Bool(flag),
            serde_json::Value::Number(number) => number.as_f64().map_or(Self::None, Self::Number),
            serde_json::Value::String(text) => Self::Text(text),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Value;
    use indexmap::IndexMap;

    #[test]
    fn merge_keeps_default_keys_missing_from_overlay() {
        let mut base = Value::Object(IndexMap::from([
            ("title".to_string(), Value::from("")),
            ("public".to_string(), Value::Bool(false)),
        ]));
        base.merge(Value::Object(IndexMap::from([(
            "title".to_string(),
            Value::from("Orbit"),
        )])));

        let map = base.as_object().expect("object");
        assert_eq!(map.get("title"), Some(&Value::from("Orbit")));
        assert_eq!(map.get("public"), Some(&Value::Bool(false)));
    }

    #[test]
    fn text_list_accepts_scalar_and_list() {
        assert_eq!(Value::from("a").to_text_list(), vec!["a".to_string()]);
        assert_eq!(
            Value::from(vec!["x".to_string(), "y".to_string()]).to_text_list(),
            vec!["x".to_string(), "y".to_string()]
        );
        assert!(Value::None.to_text_list().is_empty());
    }

    #[test]
    fn whole_numbers_format_without_fraction() {
        assert_eq!(Value::Number(5.0).to_text_scalar().as_deref(), Some("5"));
        assert_eq!(Value::Number(2.5).to_text_scalar().as_deref(), Some("2.5"));
    }

    #[test]
    fn untagged_json_round_trip() {
        let value: Value = serde_json::from_str(r#"{"a":[1,"b",true],"c":null}"#).expect("json");
        let map = value.as_object().expect("object");
        assert_eq!(
            map.get("a"),
            Some(&Value::List(vec![
                Value::Number(1.0),
                Value::from("b"),
                Value::Bool(true)
            ]))
        );
        assert_eq!(map.get("c"), Some(&Value::None));
    }
}
