//! Integration tests for change detection against a live directory

use snaptree::fs::{FileSystem, LocalFileSystem, MemoryFileSystem};
use snaptree::ignore::IgnoreRules;
use snaptree::tree::{
    compute_status, hasher, is_file_modified, seal, ChangeDetector, FileEntry, Stats, TreeBuilder,
};
use snaptree::types::DetectionMode;
use std::path::Path;
use tempfile::TempDir;

const MODES: [DetectionMode; 3] = [
    DetectionMode::OnlySizeAndMktime,
    DetectionMode::SizeAndHashForSmallFiles,
    DetectionMode::SizeAndHashForAllFiles,
];

/// Captured entry for `/w/f.bin` with size 100 and mtime 1000.0.
fn captured(hash: &str) -> FileEntry {
    FileEntry::new("f.bin", Stats::new(100, 1000.0, 1000.0)).with_hash(hash)
}

async fn check(fs: &MemoryFileSystem, file: &FileEntry, mode: DetectionMode) -> bool {
    is_file_modified(fs, Path::new("/w"), file, mode)
        .await
        .unwrap()
        .modified
}

#[tokio::test]
async fn test_size_change_is_modified_in_every_mode() {
    let fs = MemoryFileSystem::new();
    fs.add_file("/w/f.bin", vec![1u8; 200], 1000.0);

    for mode in MODES {
        assert!(check(&fs, &captured("h"), mode).await, "{:?}", mode);
    }
    assert_eq!(fs.hash_reads(), 0);
}

#[tokio::test]
async fn test_mtime_jitter_below_one_ms_is_unchanged() {
    let fs = MemoryFileSystem::new();
    fs.add_file("/w/f.bin", vec![1u8; 100], 1000.4);

    for mode in MODES {
        assert!(!check(&fs, &captured("h"), mode).await, "{:?}", mode);
    }
    assert_eq!(fs.hash_reads(), 0);
}

#[tokio::test]
async fn test_only_size_and_mtime_flags_moved_mtime() {
    let fs = MemoryFileSystem::new();
    fs.add_file("/w/f.bin", vec![1u8; 100], 1005.0);

    assert!(check(&fs, &captured("h"), DetectionMode::OnlySizeAndMktime).await);
    assert_eq!(fs.hash_reads(), 0);
}

#[tokio::test]
async fn test_small_file_with_equal_hash_is_unchanged() {
    let fs = MemoryFileSystem::new();
    let content = vec![9u8; 100];
    fs.add_file("/w/f.bin", content.clone(), 1005.0);
    let file = captured(&hasher::partial_hash_bytes(&content));

    assert!(!check(&fs, &file, DetectionMode::SizeAndHashForSmallFiles).await);
    assert_eq!(fs.hash_reads(), 1);
}

#[tokio::test]
async fn test_large_file_is_modified_without_reading() {
    let fs = MemoryFileSystem::new();
    fs.add_sized_file("/w/big.iso", vec![0u8; 16], 25_000_000, 1005.0);
    let file = FileEntry::new("big.iso", Stats::new(25_000_000, 1000.0, 1000.0)).with_hash("h");

    assert!(check(&fs, &file, DetectionMode::SizeAndHashForSmallFiles).await);
    assert_eq!(fs.hash_reads(), 0);
}

#[tokio::test]
async fn test_all_files_mode_compares_hash_regardless_of_size() {
    let fs = MemoryFileSystem::new();
    fs.add_sized_file("/w/big.iso", vec![0u8; 16], 25_000_000, 1005.0);
    let file = FileEntry::new("big.iso", Stats::new(25_000_000, 1000.0, 1000.0))
        .with_hash("stale-hash");

    assert!(check(&fs, &file, DetectionMode::SizeAndHashForAllFiles).await);
    assert_eq!(fs.hash_reads(), 1);
}

#[tokio::test]
async fn test_result_carries_live_stats() {
    let fs = MemoryFileSystem::new();
    fs.add_file("/w/f.bin", vec![1u8; 100], 1000.2);
    let file = captured("h");

    let detector = ChangeDetector::new(&fs, "/w", DetectionMode::default());
    let result = detector.is_file_modified(&file).await.unwrap();
    assert!(!result.modified);
    assert_eq!(result.file, file);
    assert_eq!(result.new_stats, Stats::new(100, 1000.2, 1000.2));
}

/// Detection on a real directory: an untouched file is unchanged, rewritten
/// content of a different size is modified.
#[tokio::test]
async fn test_detection_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    std::fs::write(root.join("doc.txt"), "first").unwrap();

    let fs = LocalFileSystem::new();
    let live = fs.stat(&root.join("doc.txt")).await.unwrap();
    let hash = fs.partial_content_hash(&root.join("doc.txt")).await.unwrap();
    let file = FileEntry::new("doc.txt", live.stats()).with_hash(hash);

    let detector = ChangeDetector::new(&fs, root, DetectionMode::SizeAndHashForAllFiles);
    assert!(!detector.is_file_modified(&file).await.unwrap().modified);

    std::fs::write(root.join("doc.txt"), "second version").unwrap();
    assert!(detector.is_file_modified(&file).await.unwrap().modified);
}

/// Names that are not NFC or that contain a backslash are checked under the
/// name they have on disk.
#[cfg(unix)]
#[tokio::test]
async fn test_detection_keeps_on_disk_names() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    std::fs::write(root.join("cafe\u{301}.txt"), "decomposed").unwrap();
    std::fs::write(root.join("a\\b.txt"), "backslash").unwrap();

    let fs = LocalFileSystem::new();
    let mut stored = TreeBuilder::new(&fs, root).build().await.unwrap();
    seal(&fs, root, &mut stored).await.unwrap();

    let detector = ChangeDetector::new(&fs, root, DetectionMode::SizeAndHashForAllFiles);
    for name in ["cafe\u{301}.txt", "a\\b.txt"] {
        let file = stored[stored.find(name).unwrap()].as_file().unwrap().clone();
        assert!(!detector.is_file_modified(&file).await.unwrap().modified, "{}", name);
    }

    std::fs::write(root.join("a\\b.txt"), "backslash, longer").unwrap();
    let report = compute_status(
        &fs,
        root,
        &stored,
        DetectionMode::SizeAndHashForAllFiles,
        IgnoreRules::default(),
    )
    .await
    .unwrap();
    assert_eq!(report.modified, vec!["a\\b.txt"]);
    assert_eq!(report.unchanged, vec!["cafe\u{301}.txt"]);
    assert!(report.added.is_empty() && report.deleted.is_empty());
}
