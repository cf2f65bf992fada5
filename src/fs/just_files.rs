//! Listing suppressor.
//!
//! Wraps a backend so that directories still resolve (and still serve their
//! `index.html`) but always list as empty.

use std::io;

use crate::fs::{DirEntry, FileSystem, Node};

#[derive(Debug, Clone)]
pub struct JustFiles<F> {
    inner: F,
}

impl<F> JustFiles<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<F: FileSystem> FileSystem for JustFiles<F> {
    async fn open(&self, path: &str) -> io::Result<Node> {
        self.inner.open(path).await
    }

    async fn read_dir(&self, _path: &str) -> io::Result<Vec<DirEntry>> {
        Ok(Vec::new())
    }
}
