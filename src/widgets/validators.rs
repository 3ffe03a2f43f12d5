use crate::core::value::{Value, format_number};
use crate::inspector::field::FieldSpec;
use std::sync::Arc;

pub type ValidationError = String;
pub type Validator = Arc<dyn Fn(&Value) -> Result<(), ValidationError> + Send + Sync>;

/// Run a list of validators against `value`, returning the first error.
pub fn run_validators(validators: &[Validator], value: &Value) -> Result<(), String> {
    for validator in validators {
        validator(value)?;
    }
    Ok(())
}

pub fn required(message: impl Into<String>) -> Validator {
    let message = message.into();
    Arc::new(move |value: &Value| {
        let blank = match value {
            Value::Text(text) => text.trim().is_empty(),
            other => other.is_empty(),
        };
        if blank { Err(message.clone()) } else { Ok(()) }
    })
}

pub fn min_length(min_len: usize, message: impl Into<String>) -> Validator {
    let message = message.into();
    Arc::new(move |value: &Value| match value.as_text() {
        Some(text) if text.chars().count() < min_len => Err(message.clone()),
        _ => Ok(()),
    })
}

pub fn max_items(max: usize, message: impl Into<String>) -> Validator {
    let message = message.into();
    Arc::new(move |value: &Value| {
        if value.to_text_list().len() > max {
            Err(message.clone())
        } else {
            Ok(())
        }
    })
}

pub fn number_range(min: f64, max: f64) -> Validator {
    Arc::new(move |value: &Value| match value.as_number() {
        Some(number) if number < min || number > max => Err(format!(
            "must be between {} and {}",
            format_number(min),
            format_number(max)
        )),
        _ => Ok(()),
    })
}

/// Rules a field spec carries beyond normalization: minimum text length,
/// tag count ceiling and, for unforced bounds, the number range.
pub fn field_validators(spec: &FieldSpec) -> Vec<Validator> {
    match spec {
        FieldSpec::Text(text) => text
            .min_chars
            .map(|min| min_length(min, format!("Use at least {min} characters")))
            .into_iter()
            .collect(),
        FieldSpec::Tags(tags) => tags
            .max_items
            .map(|max| max_items(max, format!("Pick at most {max}")))
            .into_iter()
            .collect(),
        FieldSpec::Number(bounds) => match (bounds.force, bounds.min, bounds.max) {
            (false, Some(min), Some(max)) => vec![number_range(min, max)],
            _ => Vec::new(),
        },
        FieldSpec::Boolean { .. } | FieldSpec::File(_) | FieldSpec::Reference { .. } => Vec::new(),
    }
}
