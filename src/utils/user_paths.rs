use std::path::{Path, PathBuf};

pub fn resolve_home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|home| home.trim().to_string())
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
}

pub fn expand_home_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if let Some(str_path) = path.to_str() {
        if str_path == "~" {
            if let Some(home) = resolve_home_dir() {
                return home;
            }
        }
        if let Some(rest) = str_path.strip_prefix("~/") {
            if let Some(home) = resolve_home_dir() {
                return home.join(rest);
            }
        }
    }
    path.to_path_buf()
}

/// Absolute form of `path` against the current directory, without touching
/// the filesystem. The target does not have to exist.
pub fn absolutize(path: impl AsRef<Path>) -> std::io::Result<PathBuf> {
    let expanded = expand_home_path(path);
    if expanded.is_absolute() {
        return Ok(expanded);
    }
    std::path::absolute(&expanded)
}
