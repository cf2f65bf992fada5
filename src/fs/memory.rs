//! In-memory snapshot of a document root.
//!
//! # Responsibilities
//! - Load the whole tree eagerly at startup
//! - Serve opens and listings without touching the disk
//! - Refresh or evict single paths on demand (driven by `watch.rs`)
//!
//! # Design Decisions
//! - Entries live in a `DashMap` keyed by cleaned slash path, so watcher
//!   updates and request reads never contend on one global lock
//! - Loading is blocking I/O; callers off the runtime use `spawn_blocking`

use std::collections::HashSet;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;

use crate::fs::{Content, DirEntry, FileSystem, Node};

#[derive(Debug, Clone)]
enum MemEntry {
    Dir,
    File(Bytes),
}

#[derive(Debug, Clone)]
pub struct MemoryFs {
    root: Arc<PathBuf>,
    entries: Arc<DashMap<String, MemEntry>>,
}

impl MemoryFs {
    /// Read everything under `root` into memory.
    pub fn load(root: &Path) -> io::Result<Self> {
        let fs = Self {
            root: Arc::new(root.to_path_buf()),
            entries: Arc::new(DashMap::new()),
        };
        fs.load_subtree("/")?;
        tracing::info!(
            root = %root.display(),
            entries = fs.entries.len(),
            "Document root loaded into memory"
        );
        Ok(fs)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Map an absolute path under the root to its entry key.
    pub fn key_for(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(self.root.as_path()).ok()?;
        let mut key = String::new();
        for component in rel.components() {
            match component {
                Component::Normal(part) => {
                    key.push('/');
                    key.push_str(&part.to_string_lossy());
                }
                Component::CurDir => {}
                _ => return None,
            }
        }
        if key.is_empty() {
            key.push('/');
        }
        Some(key)
    }

    fn disk_path(&self, key: &str) -> PathBuf {
        self.root.join(key.trim_start_matches('/'))
    }

    /// Bring `key` (and everything below it) in line with the disk.
    ///
    /// Fresh entries are inserted before stale ones are dropped, so readers
    /// never see a file that exists on both sides go missing.
    pub fn refresh(&self, key: &str) -> io::Result<()> {
        let fresh = match self.scan(key) {
            Ok(fresh) => fresh,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.evict(key);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let keep: HashSet<String> = fresh.iter().map(|(k, _)| k.clone()).collect();
        for (k, entry) in fresh {
            self.entries.insert(k, entry);
        }
        let prefix = subtree_prefix(key);
        self.entries
            .retain(|k, _| keep.contains(k) || (k != key && !k.starts_with(&prefix)));
        Ok(())
    }

    /// Drop `key` and all of its descendants.
    pub fn evict(&self, key: &str) {
        if key == "/" {
            self.entries.clear();
            return;
        }
        let prefix = subtree_prefix(key);
        self.entries.remove(key);
        self.entries.retain(|k, _| !k.starts_with(&prefix));
    }

    fn load_subtree(&self, key: &str) -> io::Result<()> {
        for (k, entry) in self.scan(key)? {
            self.entries.insert(k, entry);
        }
        Ok(())
    }

    /// Read `key` and everything below it from disk.
    ///
    /// Only a failure on `key` itself is an error. Descendants that vanish
    /// or cannot be read (dangling symlinks, permissions) are skipped.
    fn scan(&self, key: &str) -> io::Result<Vec<(String, MemEntry)>> {
        let (entry, mut pending) = self.read_one(key)?;
        let mut found = vec![(key.to_string(), entry)];
        while let Some(child) = pending.pop() {
            match self.read_one(&child) {
                Ok((entry, children)) => {
                    found.push((child, entry));
                    pending.extend(children);
                }
                Err(e) => {
                    tracing::warn!(path = %child, error = %e, "Skipping unreadable entry");
                }
            }
        }
        Ok(found)
    }

    /// Read a single entry, returning the keys of its children for
    /// directories.
    fn read_one(&self, key: &str) -> io::Result<(MemEntry, Vec<String>)> {
        let path = self.disk_path(key);
        if !std::fs::metadata(&path)?.is_dir() {
            let data = std::fs::read(&path)?;
            return Ok((MemEntry::File(Bytes::from(data)), Vec::new()));
        }

        let mut children = Vec::new();
        for entry in std::fs::read_dir(&path)? {
            match entry {
                Ok(entry) => {
                    children.push(join_key(key, &entry.file_name().to_string_lossy()));
                }
                Err(e) => {
                    tracing::warn!(path = %key, error = %e, "Skipping unreadable directory entry");
                }
            }
        }
        Ok((MemEntry::Dir, children))
    }
}

fn subtree_prefix(key: &str) -> String {
    if key == "/" {
        "/".to_string()
    } else {
        format!("{key}/")
    }
}

fn join_key(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

fn parent_key(key: &str) -> Option<&str> {
    match key.rsplit_once('/') {
        Some(("", _)) if key != "/" => Some("/"),
        Some((parent, _)) if !parent.is_empty() => Some(parent),
        _ => None,
    }
}

impl FileSystem for MemoryFs {
    async fn open(&self, path: &str) -> io::Result<Node> {
        let entry = self
            .entries
            .get(path)
            .map(|e| e.value().clone())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{path} not found")))?;
        Ok(match entry {
            MemEntry::Dir => Node::Dir,
            MemEntry::File(data) => Node::File {
                len: data.len() as u64,
                content: Content::Bytes(data),
            },
        })
    }

    async fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        match self.entries.get(path).map(|e| e.value().clone()) {
            Some(MemEntry::Dir) => {}
            Some(MemEntry::File(_)) => {
                return Err(io::Error::other(format!("{path} is not a directory")))
            }
            None => return Err(io::Error::new(io::ErrorKind::NotFound, format!("{path} not found"))),
        }

        let entries = self
            .entries
            .iter()
            .filter(|e| parent_key(e.key()) == Some(path))
            .map(|e| DirEntry {
                name: e.key().rsplit('/').next().unwrap_or_default().to_string(),
                is_dir: matches!(e.value(), MemEntry::Dir),
            })
            .collect();
        Ok(entries)
    }
}
