//! Pluggable byte source used by every asset loader.
//!
//! Hosts can swap the default filesystem reader for an embedded bundle or
//! a virtual filesystem.

use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
};

pub trait FileReader {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

impl<F> FileReader for F
where
    F: Fn(&Path) -> io::Result<Vec<u8>>,
{
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self(path)
    }
}

/// Reads straight from the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsReader;

impl FileReader for FsReader {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// In-memory bundle keyed by path, for embedded assets and tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryReader {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }

    pub fn with(mut self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }
}

impl FileReader for MemoryReader {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not in the bundle", path.display()),
            )
        })
    }
}
