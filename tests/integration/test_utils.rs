//! Shared test utilities for integration tests
//!
//! Fixture helpers plus serialized access to process environment variables.

use snaptree::fs::{LocalFileSystem, MemoryFileSystem};
use snaptree::tree::{seal, Tree, TreeBuilder};
use std::path::Path;
use std::sync::Mutex;

/// Serializes environment variable access across all tests in this binary.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Run `f` with the given variables set (`Some`) or removed (`None`).
/// Previous values are restored afterwards.
pub fn with_env<F, R>(vars: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(name, _)| (name.to_string(), std::env::var(name).ok()))
        .collect();

    for (name, value) in vars {
        match value {
            Some(v) => std::env::set_var(name, v),
            None => std::env::remove_var(name),
        }
    }

    let result = f();

    for (name, value) in saved {
        match value {
            Some(v) => std::env::set_var(&name, v),
            None => std::env::remove_var(&name),
        }
    }
    result
}

/// Write `(relative path, content)` pairs below `root`, creating parents.
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }
}

/// Build and seal a snapshot of an on-disk directory.
pub async fn snapshot_disk(root: &Path) -> Tree {
    let fs = LocalFileSystem::new();
    let mut tree = TreeBuilder::new(&fs, root).build().await.unwrap();
    seal(&fs, root, &mut tree).await.unwrap();
    tree
}

/// Build and seal a snapshot of an in-memory directory.
pub async fn snapshot_memory(fs: &MemoryFileSystem, root: &str) -> Tree {
    let mut tree = TreeBuilder::new(fs, root).build().await.unwrap();
    seal(fs, Path::new(root), &mut tree).await.unwrap();
    tree
}

/// Paths of the direct children of `id`, in order.
pub fn child_paths(tree: &Tree, id: snaptree::types::EntryId) -> Vec<String> {
    tree.children(id)
        .iter()
        .map(|&c| tree[c].path().to_string())
        .collect()
}
