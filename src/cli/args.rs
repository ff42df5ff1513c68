//! Command-line argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

/// Downloads monitor CLI.
#[derive(Parser, Debug)]
#[command(
    name = "downloads-monitor",
    version,
    about = "Remove duplicate e-book downloads as they arrive",
    long_about = "Watches the downloads directory for new .azw, .azw3, .epub, .mobi and .pdf files.\n\n\
                  New content is recorded; a file whose size and MD5 match recorded content is deleted."
)]
pub struct Args {
    /// Directory to watch instead of the user's downloads directory.
    #[arg(short = 'd', long = "directory", env = "DOWNLOADS_MONITOR_DIR")]
    pub watch_directory: Option<PathBuf>,

    /// Location of the known-file store.
    #[arg(short, long, env = "DOWNLOADS_MONITOR_STORE")]
    pub store: Option<PathBuf>,

    /// Number of files resolved concurrently.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Capacity of the pending event queue.
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(self, config: &mut Config) {
        if let Some(dir) = self.watch_directory {
            config.monitor.watch_directory = Some(dir);
        }

        if let Some(store) = self.store {
            config.monitor.store_path = Some(store);
        }

        if let Some(workers) = self.workers {
            config.monitor.workers = workers;
        }

        if let Some(capacity) = self.queue_capacity {
            config.monitor.queue_capacity = capacity;
        }
    }
}
