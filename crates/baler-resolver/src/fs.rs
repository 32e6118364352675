//! The filesystem seam.
//!
//! Scanning goes through `FileSystem` so bundling is testable without disk
//! access: the CLI hands in `OsFileSystem`, tests hand in `MockFileSystem`.

use rustc_hash::FxHashMap;

pub trait FileSystem: Sync {
    /// Read a file's contents; `None` when it does not exist.
    fn read_file(&self, path: &str) -> Option<String>;

    fn exists(&self, path: &str) -> bool;
}

/// Reads from the real filesystem.
#[derive(Debug, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read_file(&self, path: &str) -> Option<String> {
        std::fs::read_to_string(path).ok()
    }

    fn exists(&self, path: &str) -> bool {
        std::path::Path::new(path).exists()
    }
}

/// An in-memory path -> contents map.
#[derive(Debug, Default)]
pub struct MockFileSystem {
    files: FxHashMap<String, String>,
}

impl MockFileSystem {
    #[must_use]
    pub fn new(files: &[(&str, &str)]) -> Self {
        MockFileSystem {
            files: files
                .iter()
                .map(|(path, contents)| ((*path).to_string(), (*contents).to_string()))
                .collect(),
        }
    }

    pub fn add(&mut self, path: &str, contents: &str) {
        self.files.insert(path.to_string(), contents.to_string());
    }
}

impl FileSystem for MockFileSystem {
    fn read_file(&self, path: &str) -> Option<String> {
        self.files.get(path).cloned()
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }
}
