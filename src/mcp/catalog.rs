use crate::errors::ToolError;
use jsonschema::error::ValidationErrorKind;
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

static TOOL_CATALOG: Lazy<Vec<ToolDef>> = Lazy::new(|| {
    let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tool_catalog.json"));
    serde_json::from_str(raw).expect("tool_catalog.json must be valid JSON")
});

static TOOL_VALIDATORS: Lazy<HashMap<String, JSONSchema>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for tool in TOOL_CATALOG.iter() {
        if let Ok(schema) = JSONSchema::compile(&tool.input_schema) {
            map.insert(tool.name.clone(), schema);
        }
    }
    map
});

pub fn tool_catalog() -> &'static [ToolDef] {
    &TOOL_CATALOG
}

pub fn validate_tool_args(tool_name: &str, args: &Value) -> Result<(), ToolError> {
    let Some(schema) = TOOL_VALIDATORS.get(tool_name) else {
        return Ok(());
    };
    let rendered: Vec<String> = match schema.validate(args) {
        Ok(()) => return Ok(()),
        Err(errors) => errors
            .take(10)
            .map(|err| {
                let path = err.instance_path.to_string();
                let path = if path.is_empty() { "(root)".to_string() } else { path };
                match &err.kind {
                    ValidationErrorKind::Required { property } => format!(
                        "{}: missing required field {}",
                        path,
                        property
                            .as_str()
                            .map(|s| format!("'{}'", s))
                            .unwrap_or_else(|| property.to_string())
                    ),
                    _ => format!("{}: {}", path, err),
                }
            })
            .collect(),
    };
    let mut lines = vec![format!("Invalid arguments for {}", tool_name)];
    lines.extend(rendered.into_iter().map(|line| format!("- {}", line)));
    Err(ToolError::invalid_params(lines.join("\n")))
}
