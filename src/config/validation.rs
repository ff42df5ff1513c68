//! Configuration validation logic.

use crate::config::loader::Config;
use crate::error::{Error, Result};
use std::path::Path;

/// Upper bound for the resolve pool.
const MAX_WORKERS: usize = 64;

/// Upper bound for the pending event queue.
const MAX_QUEUE_CAPACITY: usize = 65_536;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_workers(config.monitor.workers)?;
    validate_queue_capacity(config.monitor.queue_capacity)?;

    if let Some(dir) = &config.monitor.watch_directory {
        validate_watch_directory(dir)?;
    }

    Ok(())
}

/// Validate the resolve pool size.
pub fn validate_workers(workers: usize) -> Result<()> {
    if workers == 0 || workers > MAX_WORKERS {
        return Err(Error::ConfigValidation {
            field: "workers".to_string(),
            message: format!("Must be between 1 and {} (got {})", MAX_WORKERS, workers),
        });
    }

    Ok(())
}

/// Validate the event queue capacity.
pub fn validate_queue_capacity(capacity: usize) -> Result<()> {
    if capacity == 0 || capacity > MAX_QUEUE_CAPACITY {
        return Err(Error::ConfigValidation {
            field: "queue_capacity".to_string(),
            message: format!(
                "Must be between 1 and {} (got {})",
                MAX_QUEUE_CAPACITY, capacity
            ),
        });
    }

    Ok(())
}

/// Validate an explicitly configured watch directory.
pub fn validate_watch_directory(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(Error::ConfigValidation {
            field: "watch_directory".to_string(),
            message: format!("Not an existing directory: {}", dir.display()),
        });
    }

    Ok(())
}
