//! Where docqa keeps its own data (config only; indexes live in memory).
//!
//! `DOCQA_DATA_DIR` overrides the platform location, which is handy for
//! portable installs and for keeping test runs away from the real config.

use std::path::{Path, PathBuf};

/// Environment variable that replaces the platform data directory.
pub const DATA_DIR_ENV: &str = "DOCQA_DATA_DIR";

const CONFIG_FILENAME: &str = "config.toml";

/// Directory docqa reads its config from, created on first use.
/// `None` when no location can be resolved or created.
pub fn app_data_dir() -> Option<PathBuf> {
    let override_dir = std::env::var_os(DATA_DIR_ENV).map(PathBuf::from);
    let dir = resolve_data_dir(override_dir)?;
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

/// Non-empty override wins; otherwise the platform directory
/// (`~/.local/share/docqa` on Linux, `~/Library/Application Support/app.docqa.docqa` on macOS).
fn resolve_data_dir(override_dir: Option<PathBuf>) -> Option<PathBuf> {
    match override_dir {
        Some(dir) if !dir.as_os_str().is_empty() => Some(dir),
        _ => directories::ProjectDirs::from("app", "docqa", "docqa")
            .map(|dirs| dirs.data_local_dir().to_path_buf()),
    }
}

/// Config file inside `data_dir`.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILENAME)
}
