//! Remote execution pipeline: validate the key, build the argv, run it.
//!
//! Every public entry point returns an [`ExecutionResult`]. Validation and
//! lookup failures become a failed result carrying the error code, so the
//! tool layer never has to tell a refused request apart from a remote error.

use crate::constants::limits::COMMAND_SUBSTRING_LENGTH;
use crate::errors::BrokerError;
use crate::services::command_builder::{CommandBuilder, Direction};
use crate::services::credential_store::{Credential, CredentialStore};
use crate::services::key_path::KeyPathValidator;
use crate::services::logger::Logger;
use crate::services::process_runner::{CommandRunner, ExecutionResult};
use crate::utils::text::preview_command;
use std::sync::Arc;

#[derive(Clone)]
pub struct RemoteExecutionBroker {
    logger: Logger,
    store: CredentialStore,
    validator: KeyPathValidator,
    builder: CommandBuilder,
    runner: Arc<dyn CommandRunner>,
    max_output_bytes: usize,
}

impl RemoteExecutionBroker {
    pub fn new(
        logger: Logger,
        store: CredentialStore,
        builder: CommandBuilder,
        runner: Arc<dyn CommandRunner>,
        max_output_bytes: usize,
    ) -> Self {
        Self {
            logger: logger.child("broker"),
            store,
            validator: KeyPathValidator::new(),
            builder,
            runner,
            max_output_bytes,
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Runs `command` on `username@host`, authenticating with the key at
    /// `private_key_path`.
    pub async fn execute_command(
        &self,
        host: &str,
        username: &str,
        private_key_path: &str,
        command: &str,
    ) -> ExecutionResult {
        self.try_execute_command(host, username, private_key_path, command)
            .await
            .unwrap_or_else(|err| self.refused("ssh_exec", &err))
    }

    /// Same as [`execute_command`](Self::execute_command) with the target
    /// taken from a stored credential.
    pub async fn execute_with_credential(
        &self,
        credential_name: &str,
        command: &str,
    ) -> ExecutionResult {
        let outcome = async {
            let credential = self.lookup(credential_name).await?;
            self.try_execute_command(
                &credential.host,
                &credential.username,
                &credential.private_key_path,
                command,
            )
            .await
        }
        .await;
        outcome.unwrap_or_else(|err| self.refused("ssh_exec", &err))
    }

    /// Copies between `local_path` and `remote_path` on the host named by
    /// the stored credential.
    pub async fn sync_files(
        &self,
        credential_name: &str,
        local_path: &str,
        remote_path: &str,
        direction: Direction,
    ) -> ExecutionResult {
        self.try_sync_files(credential_name, local_path, remote_path, direction)
            .await
            .unwrap_or_else(|err| self.refused("rsync_copy", &err))
    }

    async fn try_execute_command(
        &self,
        host: &str,
        username: &str,
        private_key_path: &str,
        command: &str,
    ) -> Result<ExecutionResult, BrokerError> {
        let key_path = self.validator.validate(private_key_path)?;
        let argv = self
            .builder
            .remote_command(&key_path, username, host, command);
        self.logger.info(
            "executing remote command",
            Some(&serde_json::json!({
                "target": format!("{}@{}", username, host),
                "command": preview_command(command, COMMAND_SUBSTRING_LENGTH),
            })),
        );
        self.runner.run(&argv, self.max_output_bytes).await
    }

    async fn try_sync_files(
        &self,
        credential_name: &str,
        local_path: &str,
        remote_path: &str,
        direction: Direction,
    ) -> Result<ExecutionResult, BrokerError> {
        let credential = self.lookup(credential_name).await?;
        let key_path = self.validator.validate(&credential.private_key_path)?;
        let argv = self.builder.transfer_command(
            &key_path,
            &credential.username,
            &credential.host,
            local_path,
            remote_path,
            direction,
        )?;
        self.logger.info(
            "starting transfer",
            Some(&serde_json::json!({
                "credential": credential_name,
                "direction": direction.as_str(),
                "local": local_path,
                "remote": remote_path,
            })),
        );
        self.runner.run(&argv, self.max_output_bytes).await
    }

    async fn lookup(&self, credential_name: &str) -> Result<Credential, BrokerError> {
        self.store
            .get_by_name(credential_name)
            .await?
            .ok_or_else(|| BrokerError::CredentialNotFound {
                name: credential_name.to_string(),
            })
    }

    fn refused(&self, tool: &str, err: &BrokerError) -> ExecutionResult {
        self.logger.warn(
            "request refused",
            Some(&serde_json::json!({
                "tool": tool,
                "code": err.code(),
                "error": err.to_string(),
            })),
        );
        ExecutionResult::from_error(err)
    }
}
