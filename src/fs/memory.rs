//! In-memory [`FileSystem`] with scripted metadata.
//!
//! Directory listings keep insertion order, which makes it possible to
//! reproduce listing-order effects that a real filesystem does not expose
//! reliably. Every content hash request is counted.

use super::{FileStat, FileSystem};
use crate::tree::hasher;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
enum Node {
    File {
        content: Vec<u8>,
        /// Reported size when it should differ from `content.len()`.
        size: Option<u64>,
        ctime_ms: f64,
        mtime_ms: f64,
    },
    Directory {
        names: Vec<String>,
        mtime_ms: f64,
    },
    Link {
        target: PathBuf,
    },
}

#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    nodes: Mutex<HashMap<PathBuf, Node>>,
    failing: Mutex<HashSet<PathBuf>>,
    hash_reads: AtomicUsize,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory (and any missing ancestors).
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut nodes = self.nodes.lock();
        Self::insert(
            &mut nodes,
            path.as_ref(),
            Node::Directory {
                names: Vec::new(),
                mtime_ms: 0.0,
            },
        );
    }

    /// Create or replace a file. Missing ancestors are created.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>, mtime_ms: f64) {
        let mut nodes = self.nodes.lock();
        Self::insert(
            &mut nodes,
            path.as_ref(),
            Node::File {
                content: content.into(),
                size: None,
                ctime_ms: mtime_ms,
                mtime_ms,
            },
        );
    }

    /// Create a file that reports `size` without holding that many bytes.
    pub fn add_sized_file(
        &self,
        path: impl AsRef<Path>,
        content: impl Into<Vec<u8>>,
        size: u64,
        mtime_ms: f64,
    ) {
        let mut nodes = self.nodes.lock();
        Self::insert(
            &mut nodes,
            path.as_ref(),
            Node::File {
                content: content.into(),
                size: Some(size),
                ctime_ms: mtime_ms,
                mtime_ms,
            },
        );
    }

    /// Create a symbolic link at `path` pointing to `target`.
    pub fn add_symlink(&self, path: impl AsRef<Path>, target: impl AsRef<Path>) {
        let mut nodes = self.nodes.lock();
        Self::insert(
            &mut nodes,
            path.as_ref(),
            Node::Link {
                target: target.as_ref().to_path_buf(),
            },
        );
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut nodes = self.nodes.lock();
        nodes.remove(path);
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            if let Some(Node::Directory { names, .. }) = nodes.get_mut(parent) {
                let name = name.to_string_lossy().into_owned();
                names.retain(|n| n != &name);
            }
        }
    }

    /// Make every later stat, listing or read of `path` fail.
    pub fn fail_on(&self, path: impl AsRef<Path>) {
        self.failing.lock().insert(path.as_ref().to_path_buf());
    }

    /// Number of content hashes computed so far.
    pub fn hash_reads(&self) -> usize {
        self.hash_reads.load(Ordering::SeqCst)
    }

    fn insert(nodes: &mut HashMap<PathBuf, Node>, path: &Path, node: Node) {
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            if !nodes.contains_key(parent) {
                Self::insert(
                    nodes,
                    parent,
                    Node::Directory {
                        names: Vec::new(),
                        mtime_ms: 0.0,
                    },
                );
            }
            if let Some(Node::Directory { names, .. }) = nodes.get_mut(parent) {
                let name = name.to_string_lossy().into_owned();
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        nodes.insert(path.to_path_buf(), node);
    }

    fn check(&self, path: &Path) -> io::Result<()> {
        if self.failing.lock().contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("injected failure for {}", path.display()),
            ));
        }
        Ok(())
    }

    fn node_stat(node: &Node) -> FileStat {
        match node {
            Node::File {
                content,
                size,
                ctime_ms,
                mtime_ms,
            } => FileStat {
                size: size.unwrap_or(content.len() as u64),
                ctime_ms: *ctime_ms,
                mtime_ms: *mtime_ms,
                is_directory: false,
                is_file: true,
                is_symlink: false,
            },
            Node::Directory { mtime_ms, .. } => FileStat {
                size: 0,
                ctime_ms: *mtime_ms,
                mtime_ms: *mtime_ms,
                is_directory: true,
                is_file: false,
                is_symlink: false,
            },
            Node::Link { .. } => FileStat {
                size: 0,
                ctime_ms: 0.0,
                mtime_ms: 0.0,
                is_directory: false,
                is_file: false,
                is_symlink: true,
            },
        }
    }

    fn not_found(path: &Path) -> io::Error {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no such entry: {}", path.display()),
        )
    }
}

#[async_trait]
impl FileSystem for MemoryFileSystem {
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        self.check(path)?;
        match self.nodes.lock().get(path) {
            Some(Node::Directory { names, .. }) => Ok(names.clone()),
            Some(_) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("not a directory: {}", path.display()),
            )),
            None => Err(Self::not_found(path)),
        }
    }

    async fn stat(&self, path: &Path) -> io::Result<FileStat> {
        self.check(path)?;
        let nodes = self.nodes.lock();
        match nodes.get(path) {
            Some(Node::Link { target }) => Ok(match nodes.get(target) {
                Some(node @ (Node::File { .. } | Node::Directory { .. })) => FileStat {
                    is_symlink: true,
                    ..Self::node_stat(node)
                },
                _ => FileStat {
                    size: 0,
                    ctime_ms: 0.0,
                    mtime_ms: 0.0,
                    is_directory: false,
                    is_file: false,
                    is_symlink: true,
                },
            }),
            Some(node) => Ok(Self::node_stat(node)),
            None => Err(Self::not_found(path)),
        }
    }

    async fn partial_content_hash(&self, path: &Path) -> io::Result<String> {
        self.check(path)?;
        self.hash_reads.fetch_add(1, Ordering::SeqCst);
        match self.nodes.lock().get(path) {
            Some(Node::File { content, .. }) => Ok(hasher::partial_hash_bytes(content)),
            Some(_) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("not a regular file: {}", path.display()),
            )),
            None => Err(Self::not_found(path)),
        }
    }
}
