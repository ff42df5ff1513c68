//! Downloads Monitor - removes duplicate e-book downloads as they arrive.
//!
//! The monitor watches a single directory (the user's downloads folder by
//! default). Each `.azw`, `.azw3`, `.epub`, `.mobi` or `.pdf` file that is
//! created or modified there is fingerprinted with MD5; content seen before
//! (same length and digest) is deleted, new content is recorded.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use downloads_monitor::{Config, DedupEngine, JsonFileStore, WatchService};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let store = Arc::new(JsonFileStore::open(&config.store_path()?)?);
//!     let service = WatchService::new(&config.monitor, DedupEngine::new(store));
//!
//!     let token = CancellationToken::new();
//!     let dir = downloads_monitor::fs::resolve_watch_dir(&config);
//!     let summary = service.run_or_idle(dir.as_deref(), token).await?;
//!     println!("{:?}", summary);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod dedup;
pub mod error;
pub mod fs;
pub mod output;
pub mod watch;

// Re-exports for convenience
pub use config::Config;
pub use dedup::{
    DedupEngine, FileIdentity, Fingerprint, JsonFileStore, KnownFileRecord, KnownFileStore,
    MemoryStore, Resolution, SkipReason,
};
pub use error::{Error, Result};
pub use watch::{FileArrivalEvent, WatchService, WatchSummary};
