//! In-memory remote store for tests and offline deployments.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::upload::remote::{FolderId, RemoteEntry, RemoteError, RemoteFileId, RemoteStore};

const ROOT_ID: &str = "root";

struct FolderRecord {
    name: String,
    parent: String,
}

/// A file that reached the store, with the folder it landed in.
#[derive(Clone, Debug)]
pub struct UploadRecord {
    pub path: PathBuf,
    pub folder: FolderId,
}

struct StoreState {
    folders: HashMap<String, FolderRecord>,
    uploads: Vec<UploadRecord>,
    next_id: u64,
    /// Remaining listing calls that fail with a transient error.
    failures_remaining: u32,
}

/// `RemoteStore` backed by process memory.
///
/// Supports injected transient failures so tests can exercise the workers'
/// retry loop without a network.
pub struct InMemoryRemoteStore {
    state: Mutex<StoreState>,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState {
                folders: HashMap::new(),
                uploads: Vec::new(),
                next_id: 1,
                failures_remaining: 0,
            }),
        }
    }

    /// Make the next `n` listing calls fail with a transient error.
    pub fn fail_next_listings(&self, n: u32) {
        self.lock().failures_remaining = n;
    }

    /// Snapshot of every upload that has completed.
    pub fn uploads(&self) -> Vec<UploadRecord> {
        self.lock().uploads.clone()
    }

    /// Walk `path` folder names from the root and return the id of the last
    /// component, if the whole chain exists.
    pub fn folder_id_at(&self, path: &[&str]) -> Option<FolderId> {
        let state = self.lock();
        let mut current = ROOT_ID.to_string();
        for name in path {
            let child = state
                .folders
                .iter()
                .find(|(_, rec)| rec.parent == current && rec.name == *name)?;
            current = child.0.clone();
        }
        Some(FolderId(current))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        // A poisoned store is still consistent for inspection.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteStore for InMemoryRemoteStore {
    fn root(&self) -> FolderId {
        FolderId(ROOT_ID.to_string())
    }

    fn list_children(&self, parent: &FolderId) -> Result<Vec<RemoteEntry>, RemoteError> {
        let mut state = self.lock();
        if state.failures_remaining > 0 {
            state.failures_remaining -= 1;
            return Err(RemoteError::Transient("injected listing failure".into()));
        }
        Ok(state
            .folders
            .iter()
            .filter(|(_, rec)| rec.parent == parent.0)
            .map(|(id, rec)| RemoteEntry {
                name: rec.name.clone(),
                id: id.clone(),
                is_folder: true,
            })
            .collect())
    }

    fn create_folder(&self, parent: &FolderId, name: &str) -> Result<FolderId, RemoteError> {
        let mut state = self.lock();
        if !parent.0.eq(ROOT_ID) && !state.folders.contains_key(&parent.0) {
            return Err(RemoteError::Permanent(format!(
                "parent folder {} does not exist",
                parent.0
            )));
        }
        let id = format!("folder-{}", state.next_id);
        state.next_id += 1;
        state.folders.insert(
            id.clone(),
            FolderRecord {
                name: name.to_string(),
                parent: parent.0.clone(),
            },
        );
        Ok(FolderId(id))
    }

    fn upload_file(&self, path: &Path, folder: &FolderId) -> Result<RemoteFileId, RemoteError> {
        let mut state = self.lock();
        if !folder.0.eq(ROOT_ID) && !state.folders.contains_key(&folder.0) {
            return Err(RemoteError::Permanent(format!(
                "target folder {} does not exist",
                folder.0
            )));
        }
        let id = format!("file-{}", state.next_id);
        state.next_id += 1;
        state.uploads.push(UploadRecord {
            path: path.to_path_buf(),
            folder: folder.clone(),
        });
        Ok(RemoteFileId(id))
    }
}
