//! Where included files come from.
//!
//! The parser never touches the file system directly. `@file` inclusions and
//! the default configuration are read through a [`FileSource`], so tests and
//! embedders can supply content from memory.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

pub trait FileSource {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Reads from the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSource;

impl FileSource for StdFileSource {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Serves files from an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSource {
    files: HashMap<PathBuf, String>,
}

impl MemoryFileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }
}

impl FileSource for MemoryFileSource {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_source_serves_registered_files() {
        let source = MemoryFileSource::new().with_file("args.rsp", "/verbose");
        assert_eq!(
            source.read_to_string(Path::new("args.rsp")).unwrap(),
            "/verbose"
        );
    }

    #[test]
    fn memory_source_reports_missing_files() {
        let err = MemoryFileSource::new()
            .read_to_string(Path::new("nope.rsp"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn std_source_reads_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("args.rsp");
        std::fs::write(&path, "-n demo").unwrap();
        assert_eq!(StdFileSource.read_to_string(&path).unwrap(), "-n demo");
    }
}
