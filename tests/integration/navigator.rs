//! Integration tests for tree navigation on built snapshots

use super::test_utils::{child_paths, snapshot_memory};
use snaptree::fs::MemoryFileSystem;
use snaptree::tree::Tree;

async fn fixture() -> Tree {
    let fs = MemoryFileSystem::new();
    fs.add_file("/w/docs/guide.md", "guide", 1.0);
    fs.add_file("/w/docs/img/logo.png", "png", 1.0);
    fs.add_file("/w/docs/api.md", "api", 1.0);
    fs.add_file("/w/main.rs", "fn main() {}", 1.0);
    fs.add_file("/w/.DS_Store", "junk", 1.0);
    fs.add_dir("/w/.git/objects");
    snapshot_memory(&fs, "/w").await
}

#[tokio::test]
async fn test_find_root_nested_and_absent() {
    let tree = fixture().await;
    assert_eq!(tree.find(""), Some(tree.root()));
    assert!(tree.find("docs/img/logo.png").is_some());
    assert_eq!(tree.find("nonexistent"), None);
    assert_eq!(tree.find(".git"), None);
    assert_eq!(tree.find(".DS_Store"), None);
}

#[tokio::test]
async fn test_walk_visits_in_preorder() {
    let tree = fixture().await;
    let mut order = Vec::new();
    tree.walk(tree.root(), |_, entry, _, _| order.push(entry.path().to_string()));
    assert_eq!(
        order,
        vec![
            "docs",
            "docs/guide.md",
            "docs/img",
            "docs/img/logo.png",
            "docs/api.md",
            "main.rs",
        ]
    );
}

#[tokio::test]
async fn test_remove_nested_keeps_sibling_order() {
    let mut tree = fixture().await;
    let removed = tree.remove(|entry| entry.path() == "docs/img");
    assert_eq!(removed, 1);

    let docs = tree.find("docs").unwrap();
    assert_eq!(child_paths(&tree, docs), vec!["docs/guide.md", "docs/api.md"]);
    assert_eq!(tree.find("docs/img/logo.png"), None);
}

#[tokio::test]
async fn test_remove_then_recompute_updates_hashes() {
    let mut tree = fixture().await;
    let before = tree[tree.root()].hash().map(str::to_string);

    tree.remove(|entry| entry.path().ends_with(".md"));
    let root = tree.root();
    tree.recompute_all(root).unwrap();

    assert_ne!(tree[tree.root()].hash().map(str::to_string), before);
    assert_eq!(tree[tree.find("docs").unwrap()].stats().size, 3);
}

#[tokio::test]
async fn test_get_all_tree_files_modes() {
    let tree = fixture().await;

    let deep: Vec<_> = tree.get_all_tree_files(true, false).into_keys().collect();
    assert_eq!(
        deep,
        vec!["docs/api.md", "docs/guide.md", "docs/img/logo.png", "main.rs"]
    );

    let with_dirs = tree.get_all_tree_files(true, true);
    assert!(with_dirs.contains_key("docs"));
    assert!(with_dirs.contains_key("docs/img"));
    assert_eq!(with_dirs.len(), 6);

    let shallow: Vec<_> = tree.get_all_tree_files(false, true).into_keys().collect();
    assert_eq!(shallow, vec!["main.rs"]);
}
