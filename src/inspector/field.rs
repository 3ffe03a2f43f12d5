use crate::core::document::Document;
use crate::core::property_path::PropertyPath;
use crate::core::value::Value;
use crate::inspector::DocumentKind;
use crate::inspector::normalize::{NumberBounds, TextRules};
use crate::runtime::request::FileReference;
use serde::{Deserialize, Serialize};

/// Which editor a property is rendered with, plus its options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldSpec {
    Text(TextSpec),
    Number(NumberBounds),
    Boolean {
        #[serde(default)]
        inverted: bool,
    },
    File(FileSpec),
    Tags(TagSpec),
    Reference {
        target: DocumentKind,
        #[serde(default)]
        multiple: bool,
    },
}

impl FieldSpec {
    /// Best guess from the shape of an existing value.
    pub fn infer(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Bool(_)) => Self::Boolean { inverted: false },
            Some(Value::Number(_)) => Self::Number(NumberBounds::default()),
            Some(Value::List(_)) => Self::Tags(TagSpec {
                multiple: true,
                free_solo: true,
                ..TagSpec::default()
            }),
            Some(value @ Value::Object(_)) if FileReference::from_value(value).is_some() => {
                Self::File(FileSpec::default())
            }
            _ => Self::Text(TextSpec::default()),
        }
    }

    pub fn infer_for(path: &PropertyPath, document: &Document) -> Self {
        Self::infer(document.get(path))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextSpec {
    #[serde(flatten)]
    pub rules: TextRules,
    pub multiline: bool,
    pub placeholder: Option<String>,
    pub min_chars: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSpec {
    /// Glob patterns matched against the file name, e.g. `*.png`.
    pub accept: Vec<String>,
    /// Overrides the engine-wide upload limit when smaller.
    pub max_bytes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSpec {
    pub value: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    /// Pseudo-option that triggers an action instead of selecting a value.
    #[serde(default)]
    pub action: bool,
}

impl OptionSpec {
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: None,
            group: None,
            action: false,
        }
    }

    pub fn action(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: Some(label.into()),
            group: None,
            action: true,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(self.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TagSpec {
    pub options: Vec<OptionSpec>,
    /// Values that can never be removed from a multi-value selection.
    pub fixed: Vec<String>,
    pub free_solo: bool,
    pub multiple: bool,
    pub max_items: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::FieldSpec;
    use crate::core::value::Value;

    #[test]
    fn infer_picks_editor_from_value_shape() {
        assert!(matches!(FieldSpec::infer(Some(&Value::Bool(true))), FieldSpec::Boolean { .. }));
        assert!(matches!(FieldSpec::infer(Some(&Value::Number(1.0))), FieldSpec::Number(_)));
        assert!(matches!(FieldSpec::infer(Some(&Value::List(vec![]))), FieldSpec::Tags(_)));
        assert!(matches!(FieldSpec::infer(None), FieldSpec::Text(_)));
    }

    #[test]
    fn spec_parses_from_yaml() {
        let spec: FieldSpec =
            serde_yaml::from_str("type: number\nmin: 0\nmax: 10\nstep: 5\nforce: true\n")
                .expect("yaml");
        let FieldSpec::Number(bounds) = spec else {
            panic!("expected number spec");
        };
        assert_eq!(bounds.apply(7.0), 5.0);
    }
}
