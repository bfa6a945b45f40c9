use crate::constants::storage::{DATA_DIR_NAME, DB_FILE_NAME};
use crate::utils::user_paths::{expand_home_path, resolve_home_dir};
use std::env;
use std::path::{Path, PathBuf};

pub(crate) fn normalize_env_value(value: Option<String>) -> Option<String> {
    let raw = value?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_lowercase();
    if lowered == "undefined" || lowered == "null" {
        return None;
    }
    Some(trimmed.to_string())
}

pub fn resolve_data_dir() -> PathBuf {
    match resolve_home_dir() {
        Some(home) => home.join(DATA_DIR_NAME),
        None => env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(DATA_DIR_NAME),
    }
}

pub fn resolve_db_path() -> PathBuf {
    if let Some(path) = normalize_env_value(env::var("SSH_BROKER_DB_PATH").ok()) {
        return expand_home_path(path);
    }
    resolve_data_dir().join(DB_FILE_NAME)
}

pub fn ensure_dir_exists(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
