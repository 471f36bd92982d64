use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Cursor, Read};

/// Opens input files by identifier
///
/// Workers never touch the filesystem directly; everything goes through a
/// `Source` so that inputs can come from anywhere a reader can be built.
pub trait Source: Send + Sync + 'static {
    type Reader: Read;

    /// Open `path` for reading
    fn open(&self, path: &str) -> io::Result<Self::Reader>;

    /// Get a human-readable name for this source
    fn name(&self) -> &str {
        "source"
    }
}

/// Reads files from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl Source for FsSource {
    type Reader = File;

    fn open(&self, path: &str) -> io::Result<File> {
        File::open(path)
    }

    fn name(&self) -> &str {
        "filesystem"
    }
}

/// Serves file contents held in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file
    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl Source for MemorySource {
    type Reader = Cursor<Vec<u8>>;

    fn open(&self, path: &str) -> io::Result<Self::Reader> {
        self.files
            .get(path)
            .map(|contents| Cursor::new(contents.clone()))
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no such file: {}", path)))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
