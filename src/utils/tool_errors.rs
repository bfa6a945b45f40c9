use crate::errors::{ErrorCode, McpError};
use crate::utils::suggest::suggest;

/// The one failure that escapes as a protocol error instead of a tool result.
pub fn unknown_tool_error(tool: &str, known_tools: &[&str]) -> McpError {
    let mut message = format!("Unknown tool: {}", tool);
    let suggestions = suggest(tool, known_tools, 3);
    if !suggestions.is_empty() {
        message.push_str(&format!(". Did you mean: {}?", suggestions.join(", ")));
    }
    if !known_tools.is_empty() {
        message.push_str(&format!(" Known tools: {}.", known_tools.join(", ")));
    }
    McpError::new(ErrorCode::MethodNotFound, message)
}
