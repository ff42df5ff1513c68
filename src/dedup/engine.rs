//! Duplicate resolution for newly arrived files.
//!
//! Every resolve reads the file, asks the store about its content and only
//! then acts. Nothing is cached between calls, so the created and modified
//! notifications for one write can be resolved independently.

use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::dedup::hash::{fingerprint_reader, Fingerprint};
use crate::dedup::store::{FileIdentity, KnownFileRecord, KnownFileStore, Registration};
use crate::error::Error;

/// Why a resolve left the file untouched.
#[derive(Debug)]
pub enum SkipReason {
    /// The path has no usable file name.
    InvalidName,
    /// The file had no bytes yet; its writer has likely not started.
    Empty,
    /// The file could not be read (missing, locked, still being written).
    Unreadable(io::Error),
    /// The store failed to answer or to record.
    Store(Error),
    /// The file matched a record but could not be deleted.
    DeleteFailed(io::Error),
    /// The file on disk is the very file the matching record was made from.
    AlreadyRegistered,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidName => write!(f, "path has no file name"),
            SkipReason::Empty => write!(f, "file is empty"),
            SkipReason::Unreadable(e) => write!(f, "unreadable: {}", e),
            SkipReason::Store(e) => write!(f, "{}", e),
            SkipReason::DeleteFailed(e) => write!(f, "delete failed: {}", e),
            SkipReason::AlreadyRegistered => write!(f, "already registered"),
        }
    }
}

/// Result of resolving one arrival.
#[derive(Debug)]
pub enum Resolution {
    /// New content; the file was recorded and left in place.
    Registered(KnownFileRecord),
    /// Known content; the file at `path` was deleted.
    DuplicateRemoved {
        path: PathBuf,
        original: KnownFileRecord,
    },
    /// Nothing was changed.
    Skipped(SkipReason),
}

impl Resolution {
    pub fn is_registered(&self) -> bool {
        matches!(self, Resolution::Registered(_))
    }

    pub fn is_duplicate_removed(&self) -> bool {
        matches!(self, Resolution::DuplicateRemoved { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Resolution::Skipped(_))
    }
}

/// A file as read for one resolve.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub name: String,
    pub length: u64,
    pub fingerprint: Fingerprint,
    pub identity: FileIdentity,
}

impl CandidateFile {
    /// Open and hash the file at `path`, capturing its identity from the same handle.
    pub fn read(path: &Path) -> io::Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;

        let file = File::open(path)?;
        let identity = FileIdentity::from_metadata(path, &file.metadata()?);
        let (length, fingerprint) = fingerprint_reader(file)?;

        Ok(Self {
            name,
            length,
            fingerprint,
            identity,
        })
    }
}

/// Decides, per arrived file, between registering it and deleting it.
#[derive(Clone)]
pub struct DedupEngine {
    store: Arc<dyn KnownFileStore>,
}

impl fmt::Debug for DedupEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DedupEngine").finish_non_exhaustive()
    }
}

impl DedupEngine {
    pub fn new(store: Arc<dyn KnownFileStore>) -> Self {
        Self { store }
    }

    /// Read, query, then register or delete the file at `path`.
    ///
    /// Never panics and never returns an error: every failure ends in
    /// [`Resolution::Skipped`] with the file left as it was.
    pub fn resolve(&self, path: &Path) -> Resolution {
        if path.file_name().is_none() {
            return Resolution::Skipped(SkipReason::InvalidName);
        }

        let candidate = match CandidateFile::read(path) {
            Ok(candidate) => candidate,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                return Resolution::Skipped(SkipReason::Unreadable(e));
            }
        };

        if candidate.length == 0 {
            tracing::debug!("Skipping {}: no content yet", path.display());
            return Resolution::Skipped(SkipReason::Empty);
        }

        let existing = match self
            .store
            .find_record(candidate.length, &candidate.fingerprint)
        {
            Ok(existing) => existing,
            Err(e) => {
                tracing::error!("Store lookup failed for {}: {}", path.display(), e);
                return Resolution::Skipped(SkipReason::Store(e));
            }
        };

        if let Some(record) = existing {
            return self.remove_duplicate(path, &candidate, record);
        }

        match self.store.register_record(
            &candidate.name,
            candidate.length,
            &candidate.fingerprint,
            Some(candidate.identity.clone()),
        ) {
            Ok(Registration::Inserted(record)) => {
                tracing::info!(
                    "Registered {} ({} bytes, md5 {})",
                    record.name,
                    record.length,
                    record.fingerprint
                );
                Resolution::Registered(record)
            }
            // Another resolve stored the same content between our query and now.
            Ok(Registration::AlreadyKnown(record)) => {
                self.remove_duplicate(path, &candidate, record)
            }
            Err(e) => {
                tracing::error!("Failed to register {}: {}", path.display(), e);
                Resolution::Skipped(SkipReason::Store(e))
            }
        }
    }

    fn remove_duplicate(
        &self,
        path: &Path,
        candidate: &CandidateFile,
        original: KnownFileRecord,
    ) -> Resolution {
        // A second notification for the file that produced the record.
        if original.was_made_from(&candidate.identity) {
            tracing::debug!("{} is already registered", path.display());
            return Resolution::Skipped(SkipReason::AlreadyRegistered);
        }

        match std::fs::remove_file(path) {
            Ok(()) => {
                tracing::info!(
                    "Removed duplicate {} (same content as {})",
                    path.display(),
                    original.name
                );
                Resolution::DuplicateRemoved {
                    path: path.to_path_buf(),
                    original,
                }
            }
            Err(e) => {
                tracing::warn!("Failed to remove duplicate {}: {}", path.display(), e);
                Resolution::Skipped(SkipReason::DeleteFailed(e))
            }
        }
    }
}
