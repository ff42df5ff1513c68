//! Directory resolution.

use std::path::PathBuf;

use directories::{ProjectDirs, UserDirs};

use crate::config::Config;

/// Folder name used when the platform reports no downloads directory.
const DEFAULT_FOLDER_NAME: &str = "Downloads";

/// File name of the known-file store inside the data directory.
const STORE_FILE_NAME: &str = "known_files.json";

/// Resolve the current user's downloads directory.
///
/// Falls back to `<home>/Downloads` when the platform has no dedicated
/// downloads folder configured.
pub fn resolve_downloads_dir() -> Option<PathBuf> {
    let dirs = UserDirs::new()?;

    if let Some(download_dir) = dirs.download_dir() {
        return Some(download_dir.to_path_buf());
    }

    let home = dirs.home_dir();
    if home.as_os_str().is_empty() {
        return None;
    }

    Some(home.join(DEFAULT_FOLDER_NAME))
}

/// Get the directory to watch: the configured override, else the downloads directory.
pub fn resolve_watch_dir(config: &Config) -> Option<PathBuf> {
    config
        .monitor
        .watch_directory
        .clone()
        .or_else(resolve_downloads_dir)
}

/// Default location of the known-file store.
pub fn default_store_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "downloads-monitor").map(|dirs| dirs.data_dir().join(STORE_FILE_NAME))
}

/// Ensure the parent directory of a file exists, creating it if necessary.
pub fn ensure_parent_dir(path: &std::path::Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent)
        }
        _ => Ok(()),
    }
}
