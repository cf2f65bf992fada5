//! Filesystem backends.
//!
//! # Data Flow
//! ```text
//! FsKind (config)
//!     → disk.rs      pass-through to the OS, nothing cached
//!     → memory.rs    eager in-memory snapshot of the document root
//!     → watch.rs     notify watcher keeping a memory snapshot fresh
//!     → just_files.rs  wraps all of them, hides directory listings
//!     → FileServer (http::file_server)
//! ```
//!
//! # Design Decisions
//! - Paths handed to a backend are already cleaned (`/a/b`, never `..`)
//! - The watched snapshot owns its watcher through a `WatchHandle` that is
//!   closed by consuming it, so it can only be closed once
//! - Backends are an enum rather than trait objects

pub mod disk;
pub mod just_files;
pub mod memory;
pub mod watch;

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::config::FsKind;
use crate::fs::disk::DiskFs;
use crate::fs::just_files::JustFiles;
use crate::fs::memory::MemoryFs;
use crate::fs::watch::WatchHandle;

/// Result of opening a path.
#[derive(Debug)]
pub enum Node {
    Dir,
    File { len: u64, content: Content },
}

/// Where a file's bytes come from.
#[derive(Debug)]
pub enum Content {
    Bytes(Bytes),
    File(tokio::fs::File),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Read-only view of a document root.
pub trait FileSystem: Send + Sync + 'static {
    fn open(&self, path: &str) -> impl Future<Output = io::Result<Node>> + Send;

    fn read_dir(&self, path: &str) -> impl Future<Output = io::Result<Vec<DirEntry>>> + Send;
}

/// Error building a backend.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("failed to load {path} into memory: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to watch {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// The backend selected by configuration.
#[derive(Debug, Clone)]
pub enum Backend {
    Disk(DiskFs),
    Memory(MemoryFs),
}

impl Backend {
    /// Build the backend for `root` and wrap it so listings stay hidden. The
    /// watch handle is returned for [`FsKind::MemoryWatch`] only.
    pub fn build(
        kind: FsKind,
        root: &Path,
    ) -> Result<(JustFiles<Backend>, Option<WatchHandle>), FsError> {
        let load = |root: &Path| {
            MemoryFs::load(root).map_err(|source| FsError::Load {
                path: root.to_path_buf(),
                source,
            })
        };

        let (backend, watch) = match kind {
            FsKind::Disk => (Backend::Disk(DiskFs::new(root)), None),
            FsKind::Memory => (Backend::Memory(load(root)?), None),
            FsKind::MemoryWatch => {
                let fs = load(root)?;
                let handle = watch::spawn(fs.clone()).map_err(|source| FsError::Watch {
                    path: root.to_path_buf(),
                    source,
                })?;
                (Backend::Memory(fs), Some(handle))
            }
        };

        tracing::debug!(root = %root.display(), kind = ?kind, "Filesystem backend ready");
        Ok((JustFiles::new(backend), watch))
    }
}

impl FileSystem for Backend {
    async fn open(&self, path: &str) -> io::Result<Node> {
        match self {
            Backend::Disk(fs) => fs.open(path).await,
            Backend::Memory(fs) => fs.open(path).await,
        }
    }

    async fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        match self {
            Backend::Disk(fs) => fs.read_dir(path).await,
            Backend::Memory(fs) => fs.read_dir(path).await,
        }
    }
}
