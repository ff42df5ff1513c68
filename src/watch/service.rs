//! The watch loop.
//!
//! The OS watcher feeds a bounded channel from its own thread; the async
//! dispatcher drains it and resolves each arrival on the blocking pool, at
//! most `workers` at a time.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::config::MonitorConfig;
use crate::dedup::{DedupEngine, Resolution};
use crate::error::Result;
use crate::watch::filter::{arrival_events, FileArrivalEvent};

/// Outcome counts for one run of the watch loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub registered: u64,
    pub removed: u64,
    pub skipped: u64,
}

impl WatchSummary {
    fn record(&mut self, result: std::result::Result<Resolution, JoinError>) {
        match result {
            Ok(Resolution::Registered(_)) => self.registered += 1,
            Ok(Resolution::DuplicateRemoved { .. }) => self.removed += 1,
            Ok(Resolution::Skipped(_)) => self.skipped += 1,
            Err(e) => {
                tracing::error!("Resolve task failed: {}", e);
                self.skipped += 1;
            }
        }
    }

    pub fn total(&self) -> u64 {
        self.registered + self.removed + self.skipped
    }
}

/// Builds watch sessions for a directory.
#[derive(Debug, Clone)]
pub struct WatchService {
    engine: DedupEngine,
    workers: usize,
    queue_capacity: usize,
}

impl WatchService {
    pub fn new(config: &MonitorConfig, engine: DedupEngine) -> Self {
        Self {
            engine,
            workers: config.workers.max(1),
            queue_capacity: config.queue_capacity.max(1),
        }
    }

    /// Start watching `dir`. Events are queued from this point on.
    pub fn start(&self, dir: &Path) -> Result<ActiveWatch> {
        let (tx, rx) = mpsc::channel(self.queue_capacity);

        let mut watcher = notify::recommended_watcher(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    for arrival in arrival_events(event) {
                        // Blocks the notification thread while the queue is full.
                        if tx.blocking_send(arrival).is_err() {
                            break;
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {}", e),
            },
        )?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        tracing::info!("Watching {}", dir.display());

        Ok(ActiveWatch {
            dir: dir.to_path_buf(),
            watcher,
            rx,
            engine: self.engine.clone(),
            workers: self.workers,
        })
    }

    /// Watch `dir` until cancelled. Without a usable directory, idle until cancelled.
    pub async fn run_or_idle(
        &self,
        dir: Option<&Path>,
        token: CancellationToken,
    ) -> Result<WatchSummary> {
        match dir {
            Some(dir) if dir.is_dir() => Ok(self.start(dir)?.run(token).await),
            Some(dir) => {
                tracing::warn!(
                    "{} is not a directory; duplicate monitoring disabled",
                    dir.display()
                );
                token.cancelled().await;
                Ok(WatchSummary::default())
            }
            None => {
                tracing::warn!("No downloads directory found; duplicate monitoring disabled");
                token.cancelled().await;
                Ok(WatchSummary::default())
            }
        }
    }
}

/// A live watch. Dropping it releases the OS watch handle.
pub struct ActiveWatch {
    dir: PathBuf,
    watcher: RecommendedWatcher,
    rx: mpsc::Receiver<FileArrivalEvent>,
    engine: DedupEngine,
    workers: usize,
}

impl std::fmt::Debug for ActiveWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveWatch")
            .field("dir", &self.dir)
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

impl ActiveWatch {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Dispatch arrivals until `token` is cancelled, then wait for in-flight resolves.
    pub async fn run(self, token: CancellationToken) -> WatchSummary {
        let ActiveWatch {
            dir,
            watcher,
            mut rx,
            engine,
            workers,
        } = self;

        let permits = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();
        let mut summary = WatchSummary::default();

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                Some(done) = tasks.join_next(), if !tasks.is_empty() => summary.record(done),
                arrival = rx.recv() => {
                    let Some(arrival) = arrival else {
                        tracing::warn!("Watcher for {} stopped delivering events", dir.display());
                        break;
                    };

                    let permit = tokio::select! {
                        _ = token.cancelled() => break,
                        permit = permits.clone().acquire_owned() => match permit {
                            Ok(permit) => permit,
                            Err(_) => break,
                        },
                    };

                    tracing::debug!("{:?} {}", arrival.kind, arrival.path.display());
                    let engine = engine.clone();
                    tasks.spawn_blocking(move || {
                        let _permit = permit;
                        engine.resolve(&arrival.path)
                    });
                }
            }
        }

        // Stop the producer before releasing the handle so a blocked send returns.
        rx.close();
        drop(watcher);
        drop(rx);
        tracing::info!("Stopped watching {}", dir.display());

        while let Some(done) = tasks.join_next().await {
            summary.record(done);
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::{
        FileIdentity, Fingerprint, KnownFileRecord, KnownFileStore, MemoryStore, Registration,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    const WAIT_LIMIT: Duration = Duration::from_secs(10);

    fn service(store: Arc<MemoryStore>) -> WatchService {
        WatchService::new(&MonitorConfig::default(), DedupEngine::new(store))
    }

    /// Memory store whose lookups take a while, counting how many have started.
    #[derive(Default)]
    struct SlowStore {
        inner: MemoryStore,
        finds: AtomicUsize,
    }

    impl KnownFileStore for SlowStore {
        fn find_record(
            &self,
            length: u64,
            fingerprint: &Fingerprint,
        ) -> Result<Option<KnownFileRecord>> {
            self.finds.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(400));
            self.inner.find_record(length, fingerprint)
        }

        fn register_record(
            &self,
            name: &str,
            length: u64,
            fingerprint: &Fingerprint,
            source: Option<FileIdentity>,
        ) -> Result<Registration> {
            self.inner
                .register_record(name, length, fingerprint, source)
        }
    }

    /// Write next to the target under an unmonitored name, then rename into place.
    fn drop_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let staging = dir.join(format!("{}.part", name));
        std::fs::write(&staging, data).unwrap();
        let target = dir.join(name);
        std::fs::rename(&staging, &target).unwrap();
        target
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
        let deadline = tokio::time::Instant::now() + WAIT_LIMIT;
        while tokio::time::Instant::now() < deadline {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        condition()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_registers_then_removes_duplicate() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        let watch = service(store.clone()).start(dir.path()).unwrap();
        let token = CancellationToken::new();
        let handle = tokio::spawn(watch.run(token.clone()));

        let original = drop_file(dir.path(), "alpha.epub", b"alpha book contents");
        assert!(wait_for(|| store.len() == 1).await);

        let copy = drop_file(dir.path(), "alpha_copy.epub", b"alpha book contents");
        assert!(wait_for(|| !copy.exists()).await);

        token.cancel();
        let summary = handle.await.unwrap();

        assert!(original.exists());
        assert_eq!(store.len(), 1);
        assert_eq!(summary.registered, 1);
        assert_eq!(summary.removed, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unmonitored_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        let watch = service(store.clone()).start(dir.path()).unwrap();
        let token = CancellationToken::new();
        let handle = tokio::spawn(watch.run(token.clone()));

        let notes = drop_file(dir.path(), "notes.txt", b"shopping list");
        let upper = drop_file(dir.path(), "SCAN.PDF", b"scanned");
        let book = drop_file(dir.path(), "book.pdf", b"real book");
        assert!(wait_for(|| store.len() == 1).await);

        token.cancel();
        handle.await.unwrap();

        assert!(notes.exists() && upper.exists() && book.exists());
        assert_eq!(store.records()[0].name, "book.pdf");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_lets_started_resolves_finish() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SlowStore::default());
        let watch = WatchService::new(&MonitorConfig::default(), DedupEngine::new(store.clone()))
            .start(dir.path())
            .unwrap();
        let token = CancellationToken::new();
        let handle = tokio::spawn(watch.run(token.clone()));

        let book = drop_file(dir.path(), "slow.epub", b"slow book contents");
        assert!(wait_for(|| store.finds.load(Ordering::SeqCst) > 0).await);

        // The lookup is still sleeping when the watch is told to stop.
        token.cancel();
        let summary = tokio::time::timeout(WAIT_LIMIT, handle)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(summary.registered, 1);
        assert_eq!(summary.removed, 0);
        assert_eq!(store.inner.len(), 1);
        assert!(book.exists());
    }

    #[tokio::test]
    async fn test_cancel_stops_promptly() {
        let dir = TempDir::new().unwrap();
        let watch = service(Arc::new(MemoryStore::new()))
            .start(dir.path())
            .unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let summary = tokio::time::timeout(WAIT_LIMIT, watch.run(token))
            .await
            .unwrap();
        assert_eq!(summary.total(), 0);
    }

    #[tokio::test]
    async fn test_unresolved_directory_idles_until_cancelled() {
        let token = CancellationToken::new();
        let idle = service(Arc::new(MemoryStore::new()));
        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let summary = tokio::time::timeout(WAIT_LIMIT, idle.run_or_idle(None, token))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary, WatchSummary::default());
    }

    #[tokio::test]
    async fn test_missing_directory_is_not_watched() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("Downloads");
        let token = CancellationToken::new();
        token.cancel();

        let summary = service(Arc::new(MemoryStore::new()))
            .run_or_idle(Some(&missing), token)
            .await
            .unwrap();
        assert_eq!(summary.total(), 0);
    }
}
