use crate::core::document::{Document, KIND_FIELD};
use crate::core::error::ConfigError;
use crate::core::property_path::PropertyPath;
use crate::core::value::{Value, format_number};
use crate::inspector::field::FieldSpec;
use crate::inspector::{DocContext, DocumentKind, Inspector};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Declarative description of a document kind, loaded from YAML or JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectorSchema {
    pub kind: DocumentKind,
    #[serde(default)]
    pub name_property: Option<PropertyPath>,
    #[serde(default)]
    pub fallback_name: Option<String>,
    pub properties: Vec<PropertySchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    pub path: PropertyPath,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub default: Value,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub visible_when: Option<Condition>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub pattern_message: Option<String>,
    /// No two documents of a batch may share a non-empty value.
    #[serde(default)]
    pub unique_in_batch: bool,
    #[serde(default)]
    pub field: Option<FieldSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub path: PropertyPath,
    pub equals: Value,
}

/// [`Inspector`] driven by an [`InspectorSchema`].
#[derive(Debug, Clone)]
pub struct SchemaInspector {
    schema: InspectorSchema,
    index: HashMap<PropertyPath, usize>,
    patterns: HashMap<PropertyPath, Regex>,
}

impl SchemaInspector {
    pub fn new(schema: InspectorSchema) -> Result<Self, ConfigError> {
        let mut index = HashMap::new();
        let mut patterns = HashMap::new();
        for (idx, property) in schema.properties.iter().enumerate() {
            index.insert(property.path.clone(), idx);
            if let Some(pattern) = &property.pattern {
                let regex = Regex::new(pattern).map_err(|source| ConfigError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })?;
                patterns.insert(property.path.clone(), regex);
            }
        }
        Ok(Self {
            schema,
            index,
            patterns,
        })
    }

    pub fn from_yaml_str(input: &str) -> Result<Self, ConfigError> {
        Self::new(serde_yaml::from_str(input)?)
    }

    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        Self::new(serde_json::from_str(input)?)
    }

    pub fn kind(&self) -> DocumentKind {
        self.schema.kind
    }

    pub fn schema(&self) -> &InspectorSchema {
        &self.schema
    }

    fn property(&self, path: &PropertyPath) -> Option<&PropertySchema> {
        self.index
            .get(path)
            .and_then(|idx| self.schema.properties.get(*idx))
    }

    fn label(property: &PropertySchema) -> String {
        property
            .label
            .clone()
            .unwrap_or_else(|| property.path.leaf_name().to_string())
    }

    fn is_visible(property: &PropertySchema, document: &Document) -> bool {
        if property.hidden {
            return false;
        }
        match &property.visible_when {
            Some(condition) => document.get(&condition.path) == Some(&condition.equals),
            None => true,
        }
    }

    fn normalize_value(spec: &FieldSpec, value: Value) -> Value {
        match spec {
            FieldSpec::Text(text) => match value.to_text_scalar() {
                Some(raw) => Value::Text(text.rules.apply(&raw)),
                None => value,
            },
            FieldSpec::Number(bounds) => match value.to_number() {
                Some(number) => Value::Number(bounds.apply(number)),
                None => value,
            },
            FieldSpec::Boolean { .. } => value.to_bool().map_or(value, Value::Bool),
            FieldSpec::Tags(tags) if tags.multiple => {
                let mut items: Vec<String> = tags.fixed.clone();
                for item in value.to_text_list() {
                    if !items.contains(&item) {
                        items.push(item);
                    }
                }
                Value::from(items)
            }
            FieldSpec::Tags(_) | FieldSpec::Reference { .. } | FieldSpec::File(_) => value,
        }
    }
}

impl Inspector for SchemaInspector {
    fn create_default(&self) -> Document {
        let mut document = Document::new().with(KIND_FIELD, self.schema.kind.as_str());
        for property in &self.schema.properties {
            if property.path.is_group_marker() && property.default.is_empty() {
                document.set(&property.path, Value::Object(IndexMap::new()));
                continue;
            }
            document.set(&property.path, property.default.clone());
        }
        document
    }

    fn list_visible_properties(&self, document: &Document) -> Vec<PropertyPath> {
        self.schema
            .properties
            .iter()
            .filter(|property| Self::is_visible(property, document))
            .map(|property| property.path.clone())
            .collect()
    }

    fn order_of(&self, path: &PropertyPath, _document: &Document) -> i32 {
        self.property(path).map_or(0, |property| property.order)
    }

    fn normalize(&self, mut document: Document) -> Document {
        for property in &self.schema.properties {
            let Some(spec) = &property.field else {
                continue;
            };
            let Some(current) = document.get(&property.path).cloned() else {
                continue;
            };
            let normalized = Self::normalize_value(spec, current.clone());
            if normalized != current {
                document.set(&property.path, normalized);
            }
        }
        document
    }

    fn error_of(
        &self,
        path: &PropertyPath,
        document: &Document,
        ctx: &DocContext<'_>,
    ) -> Option<String> {
        let property = self.property(path)?;
        if !Self::is_visible(property, document) {
            return None;
        }
        let label = Self::label(property);
        let value = document.get(path).cloned().unwrap_or_default();

        if property.required && value.is_empty() {
            return Some(format!("{label} is required"));
        }

        if let (Some(regex), Some(text)) = (self.patterns.get(path), value.as_text())
            && !text.is_empty()
            && !regex.is_match(text)
        {
            return Some(
                property
                    .pattern_message
                    .clone()
                    .unwrap_or_else(|| format!("{label} has an invalid format")),
            );
        }

        if let Some(FieldSpec::Number(bounds)) = &property.field
            && let Some(number) = value.as_number()
            && bounds.clamp(number) != number
        {
            let min = bounds.min.map(format_number).unwrap_or_else(|| "-∞".to_string());
            let max = bounds.max.map(format_number).unwrap_or_else(|| "∞".to_string());
            return Some(format!("{label} must be between {min} and {max}"));
        }

        if property.unique_in_batch
            && !value.is_empty()
            && ctx
                .siblings()
                .any(|sibling| sibling.get(path) == Some(&value))
        {
            return Some(format!("{label} must be unique"));
        }

        None
    }

    fn name(&self, document: &Document) -> String {
        self.schema
            .name_property
            .as_ref()
            .and_then(|path| document.get(path))
            .and_then(Value::as_text)
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
            .or_else(|| self.schema.fallback_name.clone())
            .unwrap_or_else(|| self.schema.kind.to_string())
    }

    fn label_of(&self, path: &PropertyPath) -> String {
        self.property(path)
            .map(Self::label)
            .unwrap_or_else(|| path.leaf_name().to_string())
    }

    fn field_spec(&self, path: &PropertyPath, document: &Document) -> FieldSpec {
        self.property(path)
            .and_then(|property| property.field.clone())
            .unwrap_or_else(|| FieldSpec::infer_for(path, document))
    }

    fn declared_properties(&self) -> Vec<PropertyPath> {
        self.schema
            .properties
            .iter()
            .map(|property| property.path.clone())
            .collect()
    }
}
