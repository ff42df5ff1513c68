//! Directory watching.
//!
//! Provides:
//! - Extension filtering of raw notifications
//! - The cancellable watch loop with a bounded resolve pool

pub mod filter;
pub mod service;

pub use filter::{arrival_events, is_monitored, ArrivalKind, FileArrivalEvent, MONITORED_EXTENSIONS};
pub use service::{ActiveWatch, WatchService, WatchSummary};
