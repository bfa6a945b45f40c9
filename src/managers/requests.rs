//! Typed tool requests, parsed once at the boundary.

use crate::errors::BrokerError;
use crate::services::command_builder::Direction;
use crate::services::validation::Validation;
use serde_json::Value;

/// Host and user names end up in an `ssh` operand; a leading `-` would be
/// read as an option by the client.
fn ensure_remote_token(
    validation: &Validation,
    value: Option<&Value>,
    label: &str,
) -> Result<String, BrokerError> {
    let token = validation.ensure_identifier(value, label)?;
    if token.starts_with('-') {
        return Err(BrokerError::invalid_input(format!(
            "{} must not start with '-'",
            label
        )));
    }
    if token.chars().any(char::is_whitespace) {
        return Err(BrokerError::invalid_input(format!(
            "{} must not contain whitespace",
            label
        )));
    }
    Ok(token)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecTarget {
    Inline {
        host: String,
        username: String,
        private_key_path: String,
    },
    Stored {
        credential_name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    pub target: ExecTarget,
    pub command: String,
}

impl ExecRequest {
    pub fn parse(args: &Value, validation: &Validation) -> Result<Self, BrokerError> {
        let obj = validation.ensure_object(args, "arguments")?;
        let command = validation.ensure_string(obj.get("command"), "command", false)?;

        let has_inline = ["host", "username", "privateKeyPath"]
            .iter()
            .all(|key| obj.get(*key).map(|v| !v.is_null()).unwrap_or(false));
        let credential_name =
            validation.ensure_optional_string(obj.get("credentialName"), "credentialName", true)?;

        let target = match credential_name {
            Some(credential_name) if !has_inline => ExecTarget::Stored { credential_name },
            _ => ExecTarget::Inline {
                host: ensure_remote_token(validation, obj.get("host"), "host")?,
                username: ensure_remote_token(validation, obj.get("username"), "username")?,
                private_key_path: validation.ensure_string(
                    obj.get("privateKeyPath"),
                    "privateKeyPath",
                    false,
                )?,
            },
        };
        Ok(Self { target, command })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddCredentialRequest {
    pub name: String,
    pub host: String,
    pub username: String,
    pub private_key_path: String,
}

impl AddCredentialRequest {
    pub fn parse(args: &Value, validation: &Validation) -> Result<Self, BrokerError> {
        let obj = validation.ensure_object(args, "arguments")?;
        Ok(Self {
            name: validation.ensure_identifier(obj.get("name"), "name")?,
            host: ensure_remote_token(validation, obj.get("host"), "host")?,
            username: ensure_remote_token(validation, obj.get("username"), "username")?,
            private_key_path: validation.ensure_string(
                obj.get("privateKeyPath"),
                "privateKeyPath",
                false,
            )?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveCredentialRequest {
    pub name: String,
}

impl RemoveCredentialRequest {
    pub fn parse(args: &Value, validation: &Validation) -> Result<Self, BrokerError> {
        let obj = validation.ensure_object(args, "arguments")?;
        Ok(Self {
            name: validation.ensure_identifier(obj.get("name"), "name")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub credential_name: String,
    pub local_path: String,
    pub remote_path: String,
    pub direction: Direction,
}

impl SyncRequest {
    pub fn parse(args: &Value, validation: &Validation) -> Result<Self, BrokerError> {
        let obj = validation.ensure_object(args, "arguments")?;
        let raw_direction = validation.ensure_string(obj.get("direction"), "direction", true)?;
        let direction = Direction::parse(&raw_direction).ok_or_else(|| {
            BrokerError::invalid_input(format!(
                "direction must be one of {}, got '{}'",
                Direction::ALL.join(", "),
                raw_direction
            ))
        })?;
        Ok(Self {
            credential_name: validation.ensure_identifier(
                obj.get("credentialName"),
                "credentialName",
            )?,
            local_path: validation.ensure_string(obj.get("localPath"), "localPath", true)?,
            remote_path: validation.ensure_string(obj.get("remotePath"), "remotePath", true)?,
            direction,
        })
    }
}
