#![allow(dead_code)]

use once_cell::sync::Lazy;
use serde_json::Value;
use ssh_broker::app::{App, AppConfig};
use ssh_broker::mcp::server::McpServer;
use ssh_broker::services::logger::LogLevel;
use std::path::PathBuf;
use tokio::sync::Mutex;

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub fn tmp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

/// Writes a placeholder key file; only its existence is ever checked.
pub fn write_key(dir: &PathBuf, name: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, "placeholder key").expect("write key");
    std::fs::canonicalize(&path)
        .expect("canonicalize key")
        .to_string_lossy()
        .into_owned()
}

/// Writes an executable `/bin/sh` script that stands in for a client binary,
/// so tests never depend on how a real tool treats the broker's flags.
pub fn write_script(dir: &PathBuf, name: &str, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod script");
    path.to_string_lossy().into_owned()
}

/// Prints its arguments joined by spaces, like `echo` without option parsing.
pub fn argv_echo(dir: &PathBuf) -> String {
    write_script(dir, "argv-echo", "printf '%s\\n' \"$*\"")
}

pub fn config(root: &PathBuf) -> AppConfig {
    AppConfig {
        db_path: root.join("data").join("ssh.db"),
        ssh_program: "ssh".to_string(),
        rsync_program: "rsync".to_string(),
        max_output_bytes: 1024 * 1024,
        redact_key_paths: false,
        log_level: LogLevel::Error,
    }
}

pub fn server(config: AppConfig) -> McpServer {
    McpServer::new(App::with_config(config).expect("app"))
}

pub async fn call_tool(server: &McpServer, name: &str, arguments: Value) -> Value {
    let line = serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": { "name": name, "arguments": arguments }
    })
    .to_string();
    let response = server.handle_message(&line).await.expect("response");
    serde_json::to_value(&response).expect("response json")
}

pub fn result_text(response: &Value) -> &str {
    response["result"]["content"][0]["text"]
        .as_str()
        .unwrap_or("")
}

pub fn is_error(response: &Value) -> bool {
    response["result"]["isError"].as_bool().unwrap_or(false)
}
