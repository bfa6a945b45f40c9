use crate::errors::ToolError;
use crate::managers::broker::RemoteExecutionBroker;
use crate::managers::credentials::{CredentialManager, CREDENTIAL_TOOLS};
use crate::managers::remote::{RemoteManager, REMOTE_TOOLS};
use crate::mcp::catalog::tool_catalog;
use crate::services::command_builder::{resolve_rsync_program, resolve_ssh_program, CommandBuilder};
use crate::services::credential_store::CredentialStore;
use crate::services::logger::{LogLevel, Logger};
use crate::services::process_runner::{resolve_max_output_bytes, CommandRunner, ProcessRunner};
use crate::services::tool_executor::{ToolExecutor, ToolHandler};
use crate::services::validation::Validation;
use crate::utils::feature_flags::is_key_path_redaction_enabled;
use crate::utils::paths::resolve_db_path;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Process-wide settings, read from the environment once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub ssh_program: String,
    pub rsync_program: String,
    pub max_output_bytes: usize,
    pub redact_key_paths: bool,
    pub log_level: LogLevel,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            db_path: resolve_db_path(),
            ssh_program: resolve_ssh_program(),
            rsync_program: resolve_rsync_program(),
            max_output_bytes: resolve_max_output_bytes(),
            redact_key_paths: is_key_path_redaction_enabled(),
            log_level: LogLevel::from_env(),
        }
    }
}

pub struct App {
    pub logger: Logger,
    pub tool_executor: Arc<ToolExecutor>,
}

impl App {
    fn validate_tool_wiring(handlers: &HashMap<String, Arc<dyn ToolHandler>>) -> Result<(), ToolError> {
        let mut missing: Vec<String> = tool_catalog()
            .iter()
            .filter(|tool| !handlers.contains_key(&tool.name))
            .map(|tool| tool.name.clone())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(ToolError::internal(format!(
            "Tool wiring is incomplete: {}",
            missing.join(", ")
        ))
        .with_hint("Every tool in tool_catalog.json must have a handler."))
    }

    pub fn initialize() -> Result<Self, ToolError> {
        Self::with_config(AppConfig::from_env())
    }

    pub fn with_config(config: AppConfig) -> Result<Self, ToolError> {
        let logger = Logger::new("ssh-broker").with_level(config.log_level);
        let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner::new(logger.clone()));
        Self::with_runner(config, logger, runner)
    }

    /// Wires the tool handlers around an arbitrary command runner.
    pub fn with_runner(
        config: AppConfig,
        logger: Logger,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self, ToolError> {
        let validation = Validation::new();
        let store = CredentialStore::new(logger.clone(), config.db_path.clone());
        let builder = CommandBuilder::new(config.ssh_program.clone(), config.rsync_program.clone());
        let broker = RemoteExecutionBroker::new(
            logger.clone(),
            store.clone(),
            builder,
            runner,
            config.max_output_bytes,
        );

        let credential_manager: Arc<dyn ToolHandler> = Arc::new(CredentialManager::new(
            logger.clone(),
            validation.clone(),
            store,
            config.redact_key_paths,
        ));
        let remote_manager: Arc<dyn ToolHandler> =
            Arc::new(RemoteManager::new(logger.clone(), validation, broker));

        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        for tool in CREDENTIAL_TOOLS {
            handlers.insert(tool.to_string(), credential_manager.clone());
        }
        for tool in REMOTE_TOOLS {
            handlers.insert(tool.to_string(), remote_manager.clone());
        }
        Self::validate_tool_wiring(&handlers)?;

        logger.info(
            "broker initialized",
            Some(&serde_json::json!({
                "db_path": config.db_path.display().to_string(),
                "ssh": config.ssh_program,
                "rsync": config.rsync_program,
                "max_output_bytes": config.max_output_bytes,
            })),
        );

        Ok(Self {
            tool_executor: Arc::new(ToolExecutor::new(logger.clone(), handlers)),
            logger,
        })
    }
}
