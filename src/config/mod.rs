//! Configuration module for the downloads monitor.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Configuration validation

pub mod loader;
pub mod validation;

pub use loader::{Config, MonitorConfig};
pub use validation::validate_config;
