//! Deduplication module.
//!
//! Provides:
//! - Streaming MD5 fingerprints
//! - The known-file store interface and its implementations
//! - The resolve engine that registers or removes arrived files

pub mod engine;
pub mod hash;
pub mod store;

pub use engine::{CandidateFile, DedupEngine, Resolution, SkipReason};
pub use hash::{fingerprint_file, Fingerprint};
pub use store::{
    FileIdentity, JsonFileStore, KnownFileRecord, KnownFileStore, MemoryStore, Registration,
};
