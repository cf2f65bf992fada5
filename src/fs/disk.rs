//! Pass-through backend reading straight from disk.

use std::io;
use std::path::{Path, PathBuf};

use crate::fs::{Content, DirEntry, FileSystem, Node};

#[derive(Debug, Clone)]
pub struct DiskFs {
    root: PathBuf,
}

impl DiskFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    /// Opening `a.txt/b` fails with `ENOTDIR`; report it as missing.
    async fn not_found_if_under_file(&self, full: &Path, e: io::Error) -> io::Error {
        if e.kind() == io::ErrorKind::NotFound || e.kind() == io::ErrorKind::PermissionDenied {
            return e;
        }
        for ancestor in full.ancestors().skip(1) {
            if !ancestor.starts_with(&self.root) {
                break;
            }
            if let Ok(meta) = tokio::fs::metadata(ancestor).await {
                if meta.is_file() {
                    return io::Error::new(io::ErrorKind::NotFound, e);
                }
            }
        }
        e
    }
}

impl FileSystem for DiskFs {
    async fn open(&self, path: &str) -> io::Result<Node> {
        let full = self.resolve(path);
        let meta = match tokio::fs::metadata(&full).await {
            Ok(meta) => meta,
            Err(e) => return Err(self.not_found_if_under_file(&full, e).await),
        };
        if meta.is_dir() {
            return Ok(Node::Dir);
        }
        let file = tokio::fs::File::open(&full).await?;
        Ok(Node::File {
            len: meta.len(),
            content: Content::File(file),
        })
    }

    async fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(self.resolve(path)).await?;
        while let Some(entry) = dir.next_entry().await? {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn opens_files_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "abc").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let fs = DiskFs::new(dir.path());

        assert!(matches!(fs.open("/sub").await.unwrap(), Node::Dir));
        match fs.open("/a.txt").await.unwrap() {
            Node::File { len, .. } => assert_eq!(len, 3),
            Node::Dir => panic!("expected a file"),
        }
    }

    #[tokio::test]
    async fn path_below_a_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "abc").unwrap();
        let fs = DiskFs::new(dir.path());

        let err = fs.open("/a.txt/b").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        let err = fs.open("/missing").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn deep_path_below_a_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/a.txt"), "abc").unwrap();
        let fs = DiskFs::new(dir.path());

        let err = fs.open("/sub/a.txt/b/c").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
