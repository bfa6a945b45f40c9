use crate::constants::redaction::KEY_PATH_PLACEHOLDER;
use crate::errors::ToolError;
use crate::managers::requests::{AddCredentialRequest, RemoveCredentialRequest};
use crate::mcp::protocol::ToolCallResult;
use crate::services::credential_store::{Credential, CredentialStore, NewCredential};
use crate::services::key_path::KeyPathValidator;
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use async_trait::async_trait;
use serde_json::Value;

pub const CREDENTIAL_TOOLS: &[&str] = &["add_credential", "list_credentials", "remove_credential"];

/// Handles the credential bookkeeping tools. Nothing here talks to a remote
/// host.
#[derive(Clone)]
pub struct CredentialManager {
    logger: Logger,
    validation: Validation,
    validator: KeyPathValidator,
    store: CredentialStore,
    redact_key_paths: bool,
}

impl CredentialManager {
    pub fn new(
        logger: Logger,
        validation: Validation,
        store: CredentialStore,
        redact_key_paths: bool,
    ) -> Self {
        Self {
            logger: logger.child("credentials"),
            validation,
            validator: KeyPathValidator::new(),
            store,
            redact_key_paths,
        }
    }

    pub async fn add(&self, args: Value) -> Result<ToolCallResult, ToolError> {
        let request = AddCredentialRequest::parse(&args, &self.validation)?;
        let private_key_path = self.validator.validate(&request.private_key_path)?;
        let added = self
            .store
            .add(NewCredential {
                name: request.name,
                host: request.host,
                username: request.username,
                private_key_path,
            })
            .await?;
        Ok(ToolCallResult::text(format!(
            "Credential {} added successfully",
            added.name
        )))
    }

    pub async fn list(&self) -> Result<ToolCallResult, ToolError> {
        let mut credentials = self.store.list().await?;
        if self.redact_key_paths {
            credentials.iter_mut().for_each(redact_key_path);
        }
        self.logger.debug(
            "credentials listed",
            Some(&serde_json::json!({ "count": credentials.len() })),
        );
        let rendered = serde_json::to_string_pretty(&credentials)
            .map_err(|err| ToolError::internal(format!("Failed to render credentials: {}", err)))?;
        Ok(ToolCallResult::text(rendered))
    }

    /// Removing an absent name still reports success.
    pub async fn remove(&self, args: Value) -> Result<ToolCallResult, ToolError> {
        let request = RemoveCredentialRequest::parse(&args, &self.validation)?;
        self.store.remove(&request.name).await?;
        Ok(ToolCallResult::text(format!(
            "Credential {} removed successfully",
            request.name
        )))
    }
}

fn redact_key_path(credential: &mut Credential) {
    credential.private_key_path = KEY_PATH_PLACEHOLDER.to_string();
}

#[async_trait]
impl ToolHandler for CredentialManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<ToolCallResult, ToolError> {
        match tool {
            "add_credential" => self.add(args).await,
            "list_credentials" => self.list().await,
            "remove_credential" => self.remove(args).await,
            other => Err(ToolError::internal(format!(
                "credential manager cannot handle {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Fixture {
        manager: CredentialManager,
        key_path: String,
    }

    fn fixture(redact: bool) -> Fixture {
        let root = std::env::temp_dir().join(format!("ssh-broker-creds-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&root).expect("mkdir");
        let key = root.join("id_test");
        std::fs::write(&key, "key").expect("write key");
        let logger = Logger::new("test");
        let store = CredentialStore::new(logger.clone(), root.join("ssh.db"));
        Fixture {
            manager: CredentialManager::new(logger, Validation::new(), store, redact),
            key_path: key.to_string_lossy().into_owned(),
        }
    }

    #[tokio::test]
    async fn add_then_list_shows_canonical_path() {
        let fx = fixture(false);
        let added = fx
            .manager
            .add(json!({
                "name": "box1",
                "host": "10.0.0.5",
                "username": "deploy",
                "privateKeyPath": fx.key_path
            }))
            .await
            .expect("add");
        assert_eq!(added.first_text(), "Credential box1 added successfully");

        let listed = fx.manager.list().await.expect("list");
        let parsed: Value = serde_json::from_str(listed.first_text()).expect("json");
        let canonical = std::fs::canonicalize(&fx.key_path).expect("canonicalize");
        assert_eq!(parsed[0]["name"], "box1");
        assert_eq!(
            parsed[0]["privateKeyPath"],
            canonical.to_string_lossy().as_ref()
        );
    }

    #[tokio::test]
    async fn list_can_redact_key_paths() {
        let fx = fixture(true);
        fx.manager
            .add(json!({
                "name": "box1",
                "host": "h",
                "username": "u",
                "privateKeyPath": fx.key_path
            }))
            .await
            .expect("add");
        let listed = fx.manager.list().await.expect("list");
        let parsed: Value = serde_json::from_str(listed.first_text()).expect("json");
        assert_eq!(parsed[0]["privateKeyPath"], KEY_PATH_PLACEHOLDER);
    }

    #[tokio::test]
    async fn add_with_missing_key_is_not_stored() {
        let fx = fixture(false);
        let err = fx
            .manager
            .add(json!({
                "name": "box1",
                "host": "h",
                "username": "u",
                "privateKeyPath": "/nonexistent/ssh-broker/id"
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code, "NOT_FOUND");
        let listed = fx.manager.list().await.expect("list");
        assert_eq!(listed.first_text(), "[]");
    }

    #[tokio::test]
    async fn remove_reports_success_for_absent_names() {
        let fx = fixture(false);
        let result = fx
            .manager
            .handle("remove_credential", json!({ "name": "ghost" }))
            .await
            .expect("remove");
        assert!(!result.is_error);
        assert_eq!(result.first_text(), "Credential ghost removed successfully");
    }
}
