use crate::errors::BrokerError;
use serde_json::Value;

/// Shape checks for untyped tool arguments.
#[derive(Clone, Default)]
pub struct Validation;

impl Validation {
    pub fn new() -> Self {
        Self
    }

    pub fn ensure_string(
        &self,
        value: Option<&Value>,
        label: &str,
        trim: bool,
    ) -> Result<String, BrokerError> {
        let text = value.and_then(Value::as_str).ok_or_else(|| {
            BrokerError::invalid_input(format!("{} must be a non-empty string", label))
        })?;
        let normalized = text.trim();
        if normalized.is_empty() {
            return Err(BrokerError::invalid_input(format!(
                "{} must be a non-empty string",
                label
            )));
        }
        Ok(if trim {
            normalized.to_string()
        } else {
            text.to_string()
        })
    }

    pub fn ensure_optional_string(
        &self,
        value: Option<&Value>,
        label: &str,
        trim: bool,
    ) -> Result<Option<String>, BrokerError> {
        match value {
            None => Ok(None),
            Some(val) if val.is_null() => Ok(None),
            Some(val) => self.ensure_string(Some(val), label, trim).map(Some),
        }
    }

    pub fn ensure_identifier(&self, value: Option<&Value>, label: &str) -> Result<String, BrokerError> {
        let trimmed = self.ensure_string(value, label, true)?;
        if trimmed.contains('\0') {
            return Err(BrokerError::invalid_input(format!(
                "{} must not contain null bytes",
                label
            )));
        }
        Ok(trimmed)
    }

    pub fn ensure_object(
        &self,
        value: &Value,
        label: &str,
    ) -> Result<serde_json::Map<String, Value>, BrokerError> {
        if value.is_null() {
            return Ok(serde_json::Map::new());
        }
        value
            .as_object()
            .cloned()
            .ok_or_else(|| BrokerError::invalid_input(format!("{} must be an object", label)))
    }
}
