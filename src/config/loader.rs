//! Configuration structures and loading logic.

use crate::error::{Error, Result};
use crate::fs::default_store_path;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// Watch and resolve settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Directory to watch instead of the user's downloads directory.
    #[serde(default)]
    pub watch_directory: Option<PathBuf>,

    /// Location of the known-file store.
    #[serde(default)]
    pub store_path: Option<PathBuf>,

    /// Number of files resolved concurrently.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Capacity of the queue between the watcher and the resolvers.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            watch_directory: None,
            store_path: None,
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_workers() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    256
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the effective store location.
    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.monitor.store_path {
            Some(path) => Ok(path.clone()),
            None => default_store_path().ok_or_else(|| {
                Error::Config("No data directory available; set monitor.store_path".into())
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.monitor.workers, 4);
        assert_eq!(config.monitor.queue_capacity, 256);
        assert!(config.monitor.watch_directory.is_none());
    }

    #[test]
    fn test_partial_monitor_table() {
        let config: Config = toml::from_str(
            r#"
            [monitor]
            workers = 2
            store_path = "/var/lib/monitor/known.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.monitor.workers, 2);
        assert_eq!(config.monitor.queue_capacity, 256);
        assert_eq!(
            config.store_path().unwrap(),
            PathBuf::from("/var/lib/monitor/known.json")
        );
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.monitor.watch_directory = Some(dir.path().to_path_buf());
        config.monitor.workers = 8;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.monitor.workers, 8);
        assert_eq!(
            loaded.monitor.watch_directory.as_deref(),
            Some(dir.path())
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
