use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{McpError, ToolError};
use crate::mcp::catalog::validate_tool_args;
use crate::mcp::protocol::ToolCallResult;
use crate::services::logger::Logger;
use crate::utils::arg_aliases::normalize_args_aliases;
use crate::utils::tool_errors::unknown_tool_error;

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, tool: &str, args: Value) -> Result<ToolCallResult, ToolError>;
}

/// Routes a tool call to its handler and folds every handler failure into an
/// `isError` result.
#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    handlers: Arc<HashMap<String, Arc<dyn ToolHandler>>>,
}

impl ToolExecutor {
    pub fn new(logger: Logger, handlers: HashMap<String, Arc<dyn ToolHandler>>) -> Self {
        Self {
            logger: logger.child("executor"),
            handlers: Arc::new(handlers),
        }
    }

    fn known_tools(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub async fn execute(&self, name: &str, raw_args: Value) -> Result<ToolCallResult, McpError> {
        let Some(handler) = self.handlers.get(name).cloned() else {
            self.logger
                .warn("unknown tool", Some(&serde_json::json!({ "tool": name })));
            return Err(unknown_tool_error(name, &self.known_tools()));
        };

        let raw_args = if raw_args.is_null() {
            Value::Object(Default::default())
        } else {
            raw_args
        };
        let (args, normalization) = normalize_args_aliases(name, &raw_args);
        if let Some(note) = normalization.as_ref() {
            self.logger.debug(
                "arguments normalized",
                Some(&serde_json::json!({ "tool": name, "renamed": note })),
            );
        }

        let started = chrono::Utc::now().timestamp_millis();
        let outcome = match validate_tool_args(name, &args) {
            Ok(()) => handler.handle(name, args).await,
            Err(err) => Err(err),
        };
        let duration_ms = chrono::Utc::now().timestamp_millis() - started;

        Ok(match outcome {
            Ok(result) => {
                self.logger.debug(
                    "tool finished",
                    Some(&serde_json::json!({
                        "tool": name,
                        "is_error": result.is_error,
                        "duration_ms": duration_ms,
                    })),
                );
                result
            }
            Err(err) => {
                self.logger.warn(
                    "tool failed",
                    Some(&serde_json::json!({
                        "tool": name,
                        "code": err.code,
                        "message": err.message,
                        "duration_ms": duration_ms,
                    })),
                );
                ToolCallResult::error(err.render())
            }
        })
    }
}
