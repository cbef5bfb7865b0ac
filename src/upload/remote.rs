//! Remote storage abstraction for the upload workers.
//!
//! Modeled on document-store APIs where folders are listed and created by
//! name under a parent, and files are uploaded into a folder by id. The
//! workers only ever need these four calls; anything vendor-specific stays
//! behind the trait.

use std::error::Error;
use std::fmt;
use std::path::Path;

/// Opaque remote folder identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FolderId(pub String);

/// Opaque remote file identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteFileId(pub String);

/// One entry in a remote folder listing.
#[derive(Clone, Debug)]
pub struct RemoteEntry {
    pub name: String,
    pub id: String,
    pub is_folder: bool,
}

/// Failure classification for remote calls.
///
/// The workers retry everything; the class only controls how loudly the
/// failure is logged. `Auth` failures in particular are retried rather than
/// fatal, since an expired credential is often refreshed out of band.
#[derive(Debug)]
pub enum RemoteError {
    /// Network trouble, rate limiting, 5xx: expected to clear on its own.
    Transient(String),
    /// Rejected credentials.
    Auth(String),
    /// The service understood the request and refused it.
    Permanent(String),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Transient(msg) => write!(f, "transient remote failure: {}", msg),
            RemoteError::Auth(msg) => write!(f, "remote authentication failure: {}", msg),
            RemoteError::Permanent(msg) => write!(f, "permanent remote failure: {}", msg),
        }
    }
}

impl Error for RemoteError {}

/// Minimal folder-and-file surface of the remote service.
pub trait RemoteStore: Send + Sync {
    /// Identifier of the account's root folder.
    fn root(&self) -> FolderId;

    /// List the direct children of `parent`.
    fn list_children(&self, parent: &FolderId) -> Result<Vec<RemoteEntry>, RemoteError>;

    /// Create a folder named `name` under `parent` and return its id.
    fn create_folder(&self, parent: &FolderId, name: &str) -> Result<FolderId, RemoteError>;

    /// Upload the file at `path` into `folder`.
    fn upload_file(&self, path: &Path, folder: &FolderId) -> Result<RemoteFileId, RemoteError>;
}
