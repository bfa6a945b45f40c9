pub mod command_builder;
pub mod credential_store;
pub mod key_path;
pub mod logger;
pub mod process_runner;
pub mod tool_executor;
pub mod validation;
