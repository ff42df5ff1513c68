//! Known-file store.
//!
//! The engine talks to the store through [`KnownFileStore`] only. Records are
//! keyed by `(length, fingerprint)`; the file name is informational.

use std::collections::HashMap;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dedup::hash::Fingerprint;
use crate::error::{Error, Result};
use crate::fs::ensure_parent_dir;

/// The physical file a record was made from.
///
/// A file re-created at the same path gets a new birth time (or, where the
/// filesystem keeps none, a new modification time), so it no longer matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIdentity {
    pub path: PathBuf,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
}

impl FileIdentity {
    pub fn from_metadata(path: &Path, metadata: &Metadata) -> Self {
        Self {
            path: path.to_path_buf(),
            created: metadata.created().ok().map(DateTime::<Utc>::from),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        }
    }

    /// Whether both identities describe the same file on disk.
    pub fn is_same_file(&self, other: &FileIdentity) -> bool {
        if self.path != other.path {
            return false;
        }

        match (self.created, other.created) {
            (Some(a), Some(b)) => a == b,
            _ => self.modified.is_some() && self.modified == other.modified,
        }
    }
}

/// One piece of content previously accepted into the watched directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownFileRecord {
    pub name: String,
    pub length: u64,
    pub fingerprint: Fingerprint,
    pub registered_at: DateTime<Utc>,
    /// Present when the record was made from a file in the watched directory.
    #[serde(default)]
    pub source: Option<FileIdentity>,
}

impl KnownFileRecord {
    pub fn new(
        name: String,
        length: u64,
        fingerprint: Fingerprint,
        source: Option<FileIdentity>,
    ) -> Self {
        Self {
            name,
            length,
            fingerprint,
            registered_at: Utc::now(),
            source,
        }
    }

    /// Whether this record was made from exactly the file described by `identity`.
    pub fn was_made_from(&self, identity: &FileIdentity) -> bool {
        self.source
            .as_ref()
            .is_some_and(|source| source.is_same_file(identity))
    }

    fn key(&self) -> RecordKey {
        (self.length, self.fingerprint.clone())
    }
}

/// Outcome of a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// A new record was stored.
    Inserted(KnownFileRecord),
    /// A record with the same length and fingerprint already existed.
    AlreadyKnown(KnownFileRecord),
}

/// Durable record of known content.
///
/// Implementations must be internally synchronized: the engine calls them
/// from several worker threads without holding any lock of its own.
pub trait KnownFileStore: Send + Sync {
    /// Look up a record by content identity.
    fn find_record(&self, length: u64, fingerprint: &Fingerprint)
        -> Result<Option<KnownFileRecord>>;

    /// Store a record unless one with the same `(length, fingerprint)` exists.
    ///
    /// The check and the insert are atomic with respect to other callers.
    fn register_record(
        &self,
        name: &str,
        length: u64,
        fingerprint: &Fingerprint,
        source: Option<FileIdentity>,
    ) -> Result<Registration>;
}

type RecordKey = (u64, Fingerprint);

fn lock_records(
    records: &Mutex<HashMap<RecordKey, KnownFileRecord>>,
) -> Result<MutexGuard<'_, HashMap<RecordKey, KnownFileRecord>>> {
    records
        .lock()
        .map_err(|_| Error::Store("record table lock poisoned".to_string()))
}

/// Store that keeps records in memory for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<RecordKey, KnownFileRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all records.
    pub fn records(&self) -> Vec<KnownFileRecord> {
        self.records
            .lock()
            .map(|r| r.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl KnownFileStore for MemoryStore {
    fn find_record(
        &self,
        length: u64,
        fingerprint: &Fingerprint,
    ) -> Result<Option<KnownFileRecord>> {
        let records = lock_records(&self.records)?;
        Ok(records.get(&(length, fingerprint.clone())).cloned())
    }

    fn register_record(
        &self,
        name: &str,
        length: u64,
        fingerprint: &Fingerprint,
        source: Option<FileIdentity>,
    ) -> Result<Registration> {
        let mut records = lock_records(&self.records)?;
        let key = (length, fingerprint.clone());

        if let Some(existing) = records.get(&key) {
            return Ok(Registration::AlreadyKnown(existing.clone()));
        }

        let record = KnownFileRecord::new(name.to_string(), length, fingerprint.clone(), source);
        records.insert(key, record.clone());
        Ok(Registration::Inserted(record))
    }
}

/// Store persisted as a JSON array of records.
///
/// The whole file is rewritten after every insert through a temporary file
/// and a rename, so a crash leaves either the old or the new contents.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: Mutex<HashMap<RecordKey, KnownFileRecord>>,
}

impl JsonFileStore {
    /// Open the store at `path`, loading any existing records.
    pub fn open(path: &Path) -> Result<Self> {
        let records = match fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => HashMap::new(),
            Ok(content) => {
                let list: Vec<KnownFileRecord> = serde_json::from_str(&content).map_err(|e| {
                    Error::Store(format!("Corrupt store {}: {}", path.display(), e))
                })?;
                list.into_iter().map(|r| (r.key(), r)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(Error::Store(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        tracing::debug!(
            "Loaded {} known file(s) from {}",
            records.len(),
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self, records: &HashMap<RecordKey, KnownFileRecord>) -> Result<()> {
        let mut list: Vec<&KnownFileRecord> = records.values().collect();
        list.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.name.cmp(&b.name))
        });

        let content = serde_json::to_string_pretty(&list)?;
        ensure_parent_dir(&self.path)?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl KnownFileStore for JsonFileStore {
    fn find_record(
        &self,
        length: u64,
        fingerprint: &Fingerprint,
    ) -> Result<Option<KnownFileRecord>> {
        let records = lock_records(&self.records)?;
        Ok(records.get(&(length, fingerprint.clone())).cloned())
    }

    fn register_record(
        &self,
        name: &str,
        length: u64,
        fingerprint: &Fingerprint,
        source: Option<FileIdentity>,
    ) -> Result<Registration> {
        let mut records = lock_records(&self.records)?;
        let key = (length, fingerprint.clone());

        if let Some(existing) = records.get(&key) {
            return Ok(Registration::AlreadyKnown(existing.clone()));
        }

        let record = KnownFileRecord::new(name.to_string(), length, fingerprint.clone(), source);
        records.insert(key.clone(), record.clone());

        if let Err(e) = self.persist(&records) {
            records.remove(&key);
            return Err(Error::Store(format!(
                "Failed to persist {}: {}",
                self.path.display(),
                e
            )));
        }

        Ok(Registration::Inserted(record))
    }
}
