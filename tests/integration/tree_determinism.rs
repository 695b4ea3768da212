//! Integration tests for tree building determinism

use super::test_utils::{snapshot_disk, write_files};
use snaptree::fs::LocalFileSystem;
use snaptree::tree::TreeBuilder;
use std::fs;
use tempfile::TempDir;

/// Test that the same filesystem produces the same root hash
#[tokio::test]
async fn test_same_filesystem_same_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_files(
        root,
        &[
            ("file1.txt", "content1"),
            ("file2.txt", "content2"),
            ("dir1/file3.txt", "content3"),
        ],
    );

    let fs = LocalFileSystem::new();
    let builder = TreeBuilder::new(&fs, root);
    let root1 = builder.compute_root().await.unwrap();
    let root2 = builder.compute_root().await.unwrap();

    assert_eq!(root1, root2);
}

/// Test that file content changes produce different root hashes
#[tokio::test]
async fn test_file_content_change_different_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("test.txt"), "content1").unwrap();

    let fs = LocalFileSystem::new();
    let builder = TreeBuilder::new(&fs, root);
    let root1 = builder.compute_root().await.unwrap();

    fs::write(root.join("test.txt"), "content2").unwrap();
    let root2 = builder.compute_root().await.unwrap();

    assert_ne!(root1, root2);
}

/// Test that file addition produces different root hash
#[tokio::test]
async fn test_file_addition_different_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("file1.txt"), "content").unwrap();

    let fs = LocalFileSystem::new();
    let builder = TreeBuilder::new(&fs, root);
    let root1 = builder.compute_root().await.unwrap();

    fs::write(root.join("file2.txt"), "content").unwrap();
    let root2 = builder.compute_root().await.unwrap();

    assert_ne!(root1, root2);
}

/// An empty subdirectory changes the structure and therefore the root
#[tokio::test]
async fn test_empty_directory_addition_different_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("file1.txt"), "content").unwrap();

    let before = snapshot_disk(root).await;
    fs::create_dir(root.join("empty")).unwrap();
    let after = snapshot_disk(root).await;

    assert_ne!(
        before[before.root()].hash(),
        after[after.root()].hash()
    );
}

/// Two builds of one directory serialize identically
#[tokio::test]
async fn test_repeated_builds_serialize_identically() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_files(
        root,
        &[
            ("a/b/c/deep.txt", "deep"),
            ("a/side.txt", "side"),
            ("top.bin", "top"),
        ],
    );

    let first = snapshot_disk(root).await;
    let second = snapshot_disk(root).await;
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    assert_eq!(first, second);
}
