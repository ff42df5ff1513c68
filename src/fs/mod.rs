//! Filesystem module.
//!
//! Provides:
//! - Downloads directory resolution
//! - Default store location

pub mod paths;

pub use paths::{default_store_path, ensure_parent_dir, resolve_downloads_dir, resolve_watch_dir};
