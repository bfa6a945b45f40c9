use super::BrokerError;
use serde::Serialize;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    InvalidParams,
    NotFound,
    Conflict,
    Internal,
}

/// Failure of a single tool call, rendered as an `isError` result.
#[derive(Debug, Clone, Serialize)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidParams, "INVALID_INPUT", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Internal, "INTERNAL", message)
    }

    pub fn render(&self) -> String {
        match &self.hint {
            Some(hint) => format!("{}\nhint: {}", self.message, hint),
            None => self.message.clone(),
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for ToolError {}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::internal(err.to_string())
    }
}

impl From<BrokerError> for ToolError {
    fn from(err: BrokerError) -> Self {
        let kind = match &err {
            BrokerError::InvalidInput(_) => ToolErrorKind::InvalidParams,
            BrokerError::NotFound { .. } | BrokerError::CredentialNotFound { .. } => {
                ToolErrorKind::NotFound
            }
            BrokerError::DuplicateName { .. } => ToolErrorKind::Conflict,
            BrokerError::InvalidCredential { .. }
            | BrokerError::ProcessFailure(_)
            | BrokerError::OutputTooLarge { .. }
            | BrokerError::Storage(_) => ToolErrorKind::Internal,
        };
        let hint = match &err {
            BrokerError::DuplicateName { .. } => {
                Some("Remove the existing credential first; credentials cannot be updated in place.")
            }
            BrokerError::CredentialNotFound { .. } => {
                Some("Use list_credentials to see the stored names.")
            }
            BrokerError::InvalidCredential { .. } => {
                Some("Remove the credential and add it again with a valid privateKeyPath.")
            }
            _ => None,
        };
        let tool_error = ToolError::new(kind, err.code(), err.to_string());
        match hint {
            Some(hint) => tool_error.with_hint(hint),
            None => tool_error,
        }
    }
}
