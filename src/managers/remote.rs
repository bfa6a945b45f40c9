use crate::errors::ToolError;
use crate::managers::broker::RemoteExecutionBroker;
use crate::managers::requests::{ExecRequest, ExecTarget, SyncRequest};
use crate::mcp::protocol::ToolCallResult;
use crate::services::logger::Logger;
use crate::services::process_runner::ExecutionResult;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use async_trait::async_trait;
use serde_json::Value;

pub const REMOTE_TOOLS: &[&str] = &["ssh_exec", "rsync_copy"];

const PROCESS_FAILURE: &str = "PROCESS_FAILURE";

/// Turns a pipeline outcome into tool output. Remote failures are prefixed
/// with the client name; refused requests carry the broker's own message.
fn render(result: ExecutionResult, client: &str) -> ToolCallResult {
    if result.succeeded {
        return ToolCallResult::text(result.output);
    }
    let detail = result.error_detail.unwrap_or_default();
    match result.error_code.as_deref() {
        Some(PROCESS_FAILURE) | None => {
            ToolCallResult::error(format!("{} error: {}", client, detail))
        }
        Some(_) => ToolCallResult::error(detail),
    }
}

#[derive(Clone)]
pub struct RemoteManager {
    logger: Logger,
    validation: Validation,
    broker: RemoteExecutionBroker,
}

impl RemoteManager {
    pub fn new(logger: Logger, validation: Validation, broker: RemoteExecutionBroker) -> Self {
        Self {
            logger: logger.child("remote"),
            validation,
            broker,
        }
    }

    pub async fn exec(&self, args: Value) -> Result<ToolCallResult, ToolError> {
        let request = ExecRequest::parse(&args, &self.validation)?;
        let result = match &request.target {
            ExecTarget::Inline {
                host,
                username,
                private_key_path,
            } => {
                self.broker
                    .execute_command(host, username, private_key_path, &request.command)
                    .await
            }
            ExecTarget::Stored { credential_name } => {
                self.broker
                    .execute_with_credential(credential_name, &request.command)
                    .await
            }
        };
        self.logger.debug(
            "ssh_exec finished",
            Some(&serde_json::json!({
                "succeeded": result.succeeded,
                "code": result.error_code,
            })),
        );
        Ok(render(result, "SSH"))
    }

    pub async fn copy(&self, args: Value) -> Result<ToolCallResult, ToolError> {
        let request = SyncRequest::parse(&args, &self.validation)?;
        let result = self
            .broker
            .sync_files(
                &request.credential_name,
                &request.local_path,
                &request.remote_path,
                request.direction,
            )
            .await;
        self.logger.debug(
            "rsync_copy finished",
            Some(&serde_json::json!({
                "succeeded": result.succeeded,
                "code": result.error_code,
            })),
        );
        Ok(render(result, "Rsync"))
    }
}

#[async_trait]
impl ToolHandler for RemoteManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<ToolCallResult, ToolError> {
        match tool {
            "ssh_exec" => self.exec(args).await,
            "rsync_copy" => self.copy(args).await,
            other => Err(ToolError::internal(format!(
                "remote manager cannot handle {}",
                other
            ))),
        }
    }
}
