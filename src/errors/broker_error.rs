use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStream::Stdout => write!(f, "stdout"),
            OutputStream::Stderr => write!(f, "stderr"),
        }
    }
}

/// Failures of the credential store and the execution pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Private key file not found: {path}")]
    NotFound { path: String },

    #[error("Credential not found: {name}")]
    CredentialNotFound { name: String },

    #[error("Credential already exists: {name}")]
    DuplicateName { name: String },

    #[error("Credential {name} is invalid: {reason}")]
    InvalidCredential { name: String, reason: String },

    #[error("{0}")]
    ProcessFailure(String),

    #[error("Process {stream} exceeded the {limit} byte capture limit")]
    OutputTooLarge { stream: OutputStream, limit: usize },

    #[error("Credential store error: {0}")]
    Storage(String),
}

impl BrokerError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        BrokerError::InvalidInput(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            BrokerError::InvalidInput(_) => "INVALID_INPUT",
            BrokerError::NotFound { .. } => "NOT_FOUND",
            BrokerError::CredentialNotFound { .. } => "CREDENTIAL_NOT_FOUND",
            BrokerError::DuplicateName { .. } => "DUPLICATE_NAME",
            BrokerError::InvalidCredential { .. } => "INVALID_CREDENTIAL",
            BrokerError::ProcessFailure(_) => "PROCESS_FAILURE",
            BrokerError::OutputTooLarge { .. } => "OUTPUT_TOO_LARGE",
            BrokerError::Storage(_) => "STORAGE",
        }
    }
}

impl From<rusqlite::Error> for BrokerError {
    fn from(err: rusqlite::Error) -> Self {
        BrokerError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for BrokerError {
    fn from(err: std::io::Error) -> Self {
        BrokerError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_offending_detail() {
        let err = BrokerError::NotFound {
            path: "/tmp/missing_key".to_string(),
        };
        assert_eq!(err.to_string(), "Private key file not found: /tmp/missing_key");
        assert_eq!(err.code(), "NOT_FOUND");

        let err = BrokerError::OutputTooLarge {
            stream: OutputStream::Stderr,
            limit: 16,
        };
        assert!(err.to_string().contains("stderr"));
        assert!(err.to_string().contains("16"));
    }
}
