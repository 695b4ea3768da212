//! Integration tests for tree structure correctness

use super::test_utils::{child_paths, snapshot_disk, snapshot_memory, write_files};
use snaptree::fs::{LocalFileSystem, MemoryFileSystem};
use snaptree::tree::{hasher, Entry, Tree, TreeBuilder};
use snaptree::types::FileMode;
use std::fs;
use tempfile::TempDir;

/// Test that tree contains all files and directories
#[tokio::test]
async fn test_tree_contains_all_entries() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_files(root, &[("file1.txt", "content1"), ("dir1/file2.txt", "content2")]);
    fs::create_dir(root.join("dir2")).unwrap();

    let fs = LocalFileSystem::new();
    let tree = TreeBuilder::new(&fs, root).build().await.unwrap();

    let mut files = 0;
    let mut dirs = 0;
    tree.walk(tree.root(), |_, entry, _, _| match entry {
        Entry::File(_) => files += 1,
        Entry::Directory(_) => dirs += 1,
    });
    assert_eq!(files, 2);
    assert_eq!(dirs, 2);
    assert_eq!(tree.len(), 5);
}

/// Test that the root is a directory with an empty path and no parent
#[tokio::test]
async fn test_root_is_directory() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("file.txt"), "content").unwrap();

    let tree = snapshot_disk(temp_dir.path()).await;
    let root = &tree[tree.root()];
    assert!(root.is_directory());
    assert_eq!(root.path(), "");
    assert_eq!(root.file_mode(), FileMode::Tree);
    assert_eq!(tree.parent(tree.root()), None);
}

/// Every non-root entry has a parent directory whose path prefixes its own
#[tokio::test]
async fn test_path_parent_invariant_holds_everywhere() {
    let temp_dir = TempDir::new().unwrap();
    write_files(
        temp_dir.path(),
        &[("a/b/c.txt", "c"), ("a/d.txt", "d"), ("e.txt", "e")],
    );
    let tree = snapshot_disk(temp_dir.path()).await;

    tree.walk(tree.root(), |id, entry, _, _| {
        assert!(!entry.path().is_empty());
        let parent = tree.parent(id).expect("non-root entry has a parent");
        assert!(tree[parent].is_directory());
        let parent_path = tree[parent].path();
        if !parent_path.is_empty() {
            assert!(entry.path().starts_with(&format!("{}/", parent_path)));
        }
        tree.check_invariant(id).unwrap();
    });
}

/// Directory sizes are the sum of their children and hashes aggregate
/// children in order
#[tokio::test]
async fn test_directory_size_and_hash_are_derived() {
    let fs = MemoryFileSystem::new();
    fs.add_file("/w/d/one", "1", 1.0);
    fs.add_file("/w/d/three", "333", 1.0);
    fs.add_file("/w/top", "22", 1.0);
    let tree = snapshot_memory(&fs, "/w").await;

    let d = tree.find("d").unwrap();
    assert_eq!(tree[d].stats().size, 4);
    assert_eq!(tree[tree.root()].stats().size, 6);

    let one = hasher::partial_hash_bytes(b"1");
    let three = hasher::partial_hash_bytes(b"333");
    let expected = hasher::aggregate_hash([one.as_str(), three.as_str()]);
    assert_eq!(tree[d].hash(), Some(expected.as_str()));
}

/// Children keep the order the filesystem listed them in
#[tokio::test]
async fn test_children_follow_listing_order() {
    let fs = MemoryFileSystem::new();
    fs.add_file("/w/zeta", "z", 1.0);
    fs.add_dir("/w/alpha");
    fs.add_file("/w/mid.txt", "m", 1.0);
    let tree = snapshot_memory(&fs, "/w").await;
    assert_eq!(child_paths(&tree, tree.root()), vec!["zeta", "alpha", "mid.txt"]);
}

/// File entries carry the extension of their path
#[tokio::test]
async fn test_file_extensions() {
    let fs = MemoryFileSystem::new();
    fs.add_file("/w/notes.md", "n", 1.0);
    fs.add_file("/w/Makefile", "m", 1.0);
    fs.add_file("/w/archive.tar.gz", "a", 1.0);
    let tree = snapshot_memory(&fs, "/w").await;

    let ext = |path: &str| {
        tree[tree.find(path).unwrap()]
            .as_file()
            .unwrap()
            .ext
            .clone()
    };
    assert_eq!(ext("notes.md"), ".md");
    assert_eq!(ext("Makefile"), "");
    assert_eq!(ext("archive.tar.gz"), ".gz");
}

/// A snapshot survives a JSON round trip unchanged
#[tokio::test]
async fn test_json_round_trip_preserves_tree() {
    let fs = MemoryFileSystem::new();
    fs.add_file("/w/src/main.rs", "fn main() {}", 10.5);
    fs.add_file("/w/src/util/mod.rs", "", 11.25);
    fs.add_file("/w/README", "hi", 12.0);
    let tree = snapshot_memory(&fs, "/w").await;

    let loaded = Tree::from_json(&tree.to_json().unwrap()).unwrap();
    assert_eq!(loaded, tree);
    assert!(loaded.is_sealed());
}

/// A loaded snapshot whose non-root entry has an empty path is rejected
#[test]
fn test_json_with_pathless_child_is_rejected() {
    let json = r#"{"hash":"","path":"","stats":{"size":0,"ctimeMs":0.0,"mtimeMs":0.0},
        "children":[{"hash":"h","path":"","ext":"","stats":{"size":1,"ctimeMs":0.0,"mtimeMs":0.0}}]}"#;
    assert!(Tree::from_json(json).is_err());
}

/// Clones are equal but independent
#[tokio::test]
async fn test_clone_is_deep() {
    let fs = MemoryFileSystem::new();
    fs.add_file("/w/a/x", "x", 1.0);
    let tree = snapshot_memory(&fs, "/w").await;

    let mut copy = tree.clone();
    assert_eq!(copy, tree);

    let x = copy.find("a/x").unwrap();
    copy.set_file_hash(x, "changed").unwrap();
    assert_ne!(copy, tree);
    assert_eq!(
        tree[tree.find("a/x").unwrap()].hash(),
        Some(hasher::partial_hash_bytes(b"x").as_str())
    );
}
