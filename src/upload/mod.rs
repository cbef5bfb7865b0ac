//! Concurrent upload queue.
//!
//! Saved captures are mirrored to a remote store by a pool of worker
//! threads. Workers pull tasks from a shared queue, resolve the remote
//! date-folder chain (creating missing folders on the way), and upload the
//! capture file. A task is retried with a fixed backoff until it succeeds
//! or the queue shuts down; the uploader never gives up on a capture while
//! the process is running.
//!
//! Folder resolution is serialized behind a single lock so that concurrent
//! workers can never create the same date folder twice. Resolved folder ids
//! are cached per calendar day, so the lock is cheap on the steady path.

mod memory;
mod remote;

pub use memory::{InMemoryRemoteStore, UploadRecord};
pub use remote::{FolderId, RemoteEntry, RemoteError, RemoteFileId, RemoteStore};

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, Local};
use log::{debug, error, info, warn};

use crate::storage::{self, DetectionStore};

/// Name of the remote folder the whole archive lives under.
const REMOTE_ROOT_FOLDER: &str = "detected";

/// One capture to mirror, identified by its timestamp. The local path and
/// the remote folder chain are both derived from it.
#[derive(Clone, Debug)]
pub struct UploadTask {
    pub timestamp: DateTime<Local>,
}

#[derive(Clone, Debug)]
pub struct UploadQueueConfig {
    pub workers: usize,
    /// How long an idle worker sleeps before polling the queue again.
    pub poll_interval: Duration,
    /// Fixed delay between retries of a failed task.
    pub retry_backoff: Duration,
}

impl Default for UploadQueueConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            poll_interval: Duration::from_millis(100),
            retry_backoff: Duration::from_secs(1),
        }
    }
}

#[derive(Default)]
struct FolderCache {
    by_day: HashMap<(i32, u32, u32), FolderId>,
}

struct Shared {
    queue: Mutex<VecDeque<UploadTask>>,
    running: AtomicBool,
    resolver: Mutex<FolderCache>,
}

/// Cloneable producer side of the queue.
#[derive(Clone)]
pub struct QueueHandle {
    shared: Arc<Shared>,
}

impl QueueHandle {
    pub fn enqueue(&self, task: UploadTask) {
        lock_recover(&self.shared.queue).push_back(task);
    }

    /// Tasks currently waiting (not counting ones a worker holds).
    pub fn len(&self) -> usize {
        lock_recover(&self.shared.queue).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Worker pool mirroring saved captures to a [`RemoteStore`].
pub struct UploadQueue {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl UploadQueue {
    /// Spawn the worker pool. Workers run until [`UploadQueue::quit`].
    pub fn start(
        remote: Arc<dyn RemoteStore>,
        files: DetectionStore,
        config: UploadQueueConfig,
    ) -> Result<Self> {
        if config.workers == 0 {
            return Err(anyhow!("upload queue needs at least one worker"));
        }

        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            running: AtomicBool::new(true),
            resolver: Mutex::new(FolderCache::default()),
        });

        let mut workers = Vec::with_capacity(config.workers);
        for worker_id in 0..config.workers {
            let shared = Arc::clone(&shared);
            let remote = Arc::clone(&remote);
            let files = files.clone();
            let config = config.clone();
            let handle = thread::Builder::new()
                .name(format!("upload-{worker_id}"))
                .spawn(move || worker_loop(worker_id, shared, remote, files, config))?;
            workers.push(handle);
        }

        info!("upload queue started with {} worker(s)", config.workers);
        Ok(Self { shared, workers })
    }

    /// Producer handle for enqueueing tasks.
    pub fn handle(&self) -> QueueHandle {
        QueueHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Stop the workers and wait for them to exit. Tasks still queued or
    /// mid-retry are abandoned.
    pub fn quit(mut self) -> Result<()> {
        self.shared.running.store(false, Ordering::SeqCst);
        let mut first_panic = None;
        for worker in self.workers.drain(..) {
            if worker.join().is_err() && first_panic.is_none() {
                first_panic = Some(anyhow!("upload worker panicked"));
            }
        }
        match first_panic {
            Some(err) => Err(err),
            None => {
                info!("upload queue stopped");
                Ok(())
            }
        }
    }
}

fn worker_loop(
    worker_id: usize,
    shared: Arc<Shared>,
    remote: Arc<dyn RemoteStore>,
    files: DetectionStore,
    config: UploadQueueConfig,
) {
    debug!("upload worker {} running", worker_id);
    while shared.running.load(Ordering::SeqCst) {
        let task = lock_recover(&shared.queue).pop_front();
        match task {
            Some(task) => process_task(worker_id, &shared, remote.as_ref(), &files, &config, task),
            None => thread::sleep(config.poll_interval),
        }
    }
    debug!("upload worker {} exiting", worker_id);
}

/// Run one task to completion, retrying with a fixed backoff. Only a queue
/// shutdown abandons the task.
fn process_task(
    worker_id: usize,
    shared: &Shared,
    remote: &dyn RemoteStore,
    files: &DetectionStore,
    config: &UploadQueueConfig,
    task: UploadTask,
) {
    let path = files.file_path_for(&task.timestamp);
    let mut attempt = 0u64;

    while shared.running.load(Ordering::SeqCst) {
        attempt += 1;
        match attempt_upload(shared, remote, &task, &path) {
            Ok(file_id) => {
                info!(
                    "worker {}: uploaded {} as {} (attempt {})",
                    worker_id,
                    path.display(),
                    file_id.0,
                    attempt
                );
                return;
            }
            Err(RemoteError::Auth(msg)) => {
                error!(
                    "worker {}: authentication rejected uploading {} (attempt {}): {}",
                    worker_id,
                    path.display(),
                    attempt,
                    msg
                );
            }
            Err(err) => {
                warn!(
                    "worker {}: upload of {} failed (attempt {}): {}",
                    worker_id,
                    path.display(),
                    attempt,
                    err
                );
            }
        }
        thread::sleep(config.retry_backoff);
    }
    warn!(
        "worker {}: abandoning {} after shutdown",
        worker_id,
        path.display()
    );
}

fn attempt_upload(
    shared: &Shared,
    remote: &dyn RemoteStore,
    task: &UploadTask,
    path: &std::path::Path,
) -> Result<RemoteFileId, RemoteError> {
    let folder = resolve_day_folder(shared, remote, &task.timestamp)?;
    remote.upload_file(path, &folder)
}

/// Resolve (and create as needed) `detected/<year>/<month>/<day>` on the
/// remote, returning the day folder's id.
///
/// Held under one lock for the whole walk so two workers can never race a
/// create for the same folder name.
fn resolve_day_folder(
    shared: &Shared,
    remote: &dyn RemoteStore,
    ts: &DateTime<Local>,
) -> Result<FolderId, RemoteError> {
    let key = (ts.year(), ts.month(), ts.day());
    let mut cache = lock_recover(&shared.resolver);
    if let Some(id) = cache.by_day.get(&key) {
        return Ok(id.clone());
    }

    let mut current = remote.root();
    for name in [
        REMOTE_ROOT_FOLDER.to_string(),
        storage::year_folder(ts),
        storage::month_folder(ts),
        storage::day_folder(ts),
    ] {
        current = find_or_create(remote, &current, &name)?;
    }

    cache.by_day.insert(key, current.clone());
    Ok(current)
}

fn find_or_create(
    remote: &dyn RemoteStore,
    parent: &FolderId,
    name: &str,
) -> Result<FolderId, RemoteError> {
    let existing = remote
        .list_children(parent)?
        .into_iter()
        .find(|entry| entry.is_folder && entry.name == name);
    match existing {
        Some(entry) => Ok(FolderId(entry.id)),
        None => remote.create_folder(parent, name),
    }
}

/// Lock a mutex, recovering the guard if a previous holder panicked.
fn lock_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 8, 24, 14, 3, 27).unwrap()
    }

    #[test]
    fn folder_resolution_creates_the_full_chain_once() -> Result<(), RemoteError> {
        let shared = Shared {
            queue: Mutex::new(VecDeque::new()),
            running: AtomicBool::new(true),
            resolver: Mutex::new(FolderCache::default()),
        };
        let store = InMemoryRemoteStore::new();

        let first = resolve_day_folder(&shared, &store, &ts())?;
        let second = resolve_day_folder(&shared, &store, &ts())?;
        assert_eq!(first, second);

        // Exactly one folder per level, reachable by name from the root.
        assert_eq!(
            store.folder_id_at(&["detected", "2026", "8. August", "24"]),
            Some(first)
        );
        Ok(())
    }

    #[test]
    fn existing_folders_are_reused_not_duplicated() -> Result<(), RemoteError> {
        let store = InMemoryRemoteStore::new();
        let pre = store.create_folder(&store.root(), "detected")?;

        let shared = Shared {
            queue: Mutex::new(VecDeque::new()),
            running: AtomicBool::new(true),
            resolver: Mutex::new(FolderCache::default()),
        };
        resolve_day_folder(&shared, &store, &ts())?;

        assert_eq!(store.folder_id_at(&["detected"]), Some(pre));
        Ok(())
    }

    #[test]
    fn queue_rejects_zero_workers() {
        let result = UploadQueue::start(
            Arc::new(InMemoryRemoteStore::new()),
            DetectionStore::new("detected"),
            UploadQueueConfig {
                workers: 0,
                ..UploadQueueConfig::default()
            },
        );
        assert!(result.is_err());
    }
}
