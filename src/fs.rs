//! Filesystem access used by the tree builder and the change detector.
//!
//! The engine never touches `std::fs` directly: listing, stat and content
//! hashing go through [`FileSystem`], so the same code runs against a real
//! working directory ([`LocalFileSystem`]) or a scripted one
//! ([`MemoryFileSystem`]).

use async_trait::async_trait;
use std::io;
use std::path::Path;

mod local;
mod memory;

pub use local::LocalFileSystem;
pub use memory::MemoryFileSystem;

/// Result of a live `stat`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FileStat {
    pub size: u64,
    pub ctime_ms: f64,
    pub mtime_ms: f64,
    pub is_directory: bool,
    pub is_file: bool,
    /// The path itself is a symbolic link. The other fields describe its
    /// target, or the link when the target is missing.
    pub is_symlink: bool,
}

impl FileStat {
    pub fn stats(&self) -> crate::tree::node::Stats {
        crate::tree::node::Stats::new(self.size, self.ctime_ms, self.mtime_ms)
    }
}

#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Names of the entries in a directory, in listing order.
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Metadata of the entry at `path`, following symlinks.
    async fn stat(&self, path: &Path) -> io::Result<FileStat>;

    /// Hex digest of a bounded sample of the file's bytes.
    ///
    /// See [`crate::tree::hasher::sample_ranges`] for the sampled windows.
    async fn partial_content_hash(&self, path: &Path) -> io::Result<String>;
}
