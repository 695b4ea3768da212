//! Tree builder for snapshotting a working directory
//!
//! Building walks the directory concurrently: every entry of a level is
//! statted (and, for subdirectories, walked) in its own future, and the level
//! is finalized once all of them resolved. Results are attached in listing
//! order, never in completion order, because directory hashes depend on the
//! order of their children.
//!
//! Building does not read file content. Files come out unsealed and
//! [`seal`] assigns their hashes afterwards.
//!
//! Entry paths use names exactly as the directory listing returns them.
//! Symbolic links are skipped.

use crate::error::TreeError;
use crate::fs::FileSystem;
use crate::ignore::IgnoreRules;
use crate::tree::node::{Entry, FileEntry, Stats, Tree};
use crate::tree::path;
use crate::types::{EntryId, Hash};
use futures::future::{try_join_all, BoxFuture, FutureExt};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument, trace};

/// Maximum number of files hashed at once while sealing.
const SEAL_CONCURRENCY: usize = 32;

/// A walked entry that is not yet part of a tree.
#[derive(Debug)]
enum Scanned {
    File {
        path: String,
        stats: Stats,
    },
    Directory {
        path: String,
        stats: Stats,
        children: Vec<Scanned>,
    },
}

/// Builds [`Tree`]s from a directory on a [`FileSystem`].
pub struct TreeBuilder<'a> {
    fs: &'a dyn FileSystem,
    root: PathBuf,
    ignore: IgnoreRules,
}

impl<'a> TreeBuilder<'a> {
    /// Create a builder for the directory at `root`. A trailing separator is
    /// ignored.
    pub fn new(fs: &'a dyn FileSystem, root: impl AsRef<Path>) -> Self {
        let root = path::trim_root(root.as_ref());
        Self {
            fs,
            root,
            ignore: IgnoreRules::default(),
        }
    }

    pub fn with_ignore_rules(mut self, rules: IgnoreRules) -> Self {
        self.ignore = rules;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the root directory and return a fresh, unsealed tree.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn build(&self) -> Result<Tree, TreeError> {
        let start = Instant::now();
        info!("Starting tree build");

        let root_stat = self
            .fs
            .stat(&self.root)
            .await
            .map_err(|e| TreeError::io(&self.root, e))?;
        if !root_stat.is_directory {
            return Err(TreeError::NotADirectory(self.root.display().to_string()));
        }

        let mut tree = Tree::with_root_stats(Stats::new(0, root_stat.ctime_ms, root_stat.mtime_ms));
        let root = tree.root();
        self.build_into(&mut tree, root).await?;

        info!(
            entry_count = tree.len(),
            size = tree[root].stats().size,
            duration_ms = start.elapsed().as_millis(),
            "Tree build completed"
        );
        Ok(tree)
    }

    /// Populate an existing directory of `tree` from disk.
    ///
    /// The directory's path is resolved against the builder's root. Its new
    /// children are appended after any it already has, and its size becomes
    /// the sum of all of them. On error `tree` is left untouched.
    pub async fn build_into(&self, tree: &mut Tree, dir: EntryId) -> Result<(), TreeError> {
        let rel_dir = match tree.get(dir) {
            Some(Entry::Directory(d)) => d.path.clone(),
            Some(Entry::File(f)) => return Err(TreeError::NotADirectory(f.path.clone())),
            None => {
                return Err(TreeError::InvariantViolation(format!(
                    "unknown entry {}",
                    dir
                )))
            }
        };

        let abs_dir = path::resolve(&self.root, &rel_dir);
        let scanned = self.scan(abs_dir, rel_dir).await?;
        attach(tree, dir, scanned)?;
        tree.sum_directory_size(dir);
        Ok(())
    }

    fn scan(&self, dir: PathBuf, rel_dir: String) -> BoxFuture<'_, Result<Vec<Scanned>, TreeError>> {
        async move {
            let names = self
                .fs
                .read_dir(&dir)
                .await
                .map_err(|e| TreeError::io(&dir, e))?;
            trace!(dir = %dir.display(), count = names.len(), "Listed directory");

            let pending = names
                .into_iter()
                .filter(|name| {
                    let skip = self.ignore.should_skip(name);
                    if skip {
                        debug!(name = %name, "Skipping ignored entry");
                    }
                    !skip
                })
                .map(|name| {
                    let abs = dir.join(&name);
                    let rel = path::join(&rel_dir, &name);
                    self.scan_entry(abs, rel)
                });

            let results = try_join_all(pending).await?;
            Ok(results.into_iter().flatten().collect())
        }
        .boxed()
    }

    async fn scan_entry(&self, abs: PathBuf, rel: String) -> Result<Option<Scanned>, TreeError> {
        let stat = self
            .fs
            .stat(&abs)
            .await
            .map_err(|e| TreeError::io(&abs, e))?;

        if stat.is_symlink {
            trace!(path = %abs.display(), "Skipping symbolic link");
            Ok(None)
        } else if stat.is_directory {
            let children = self.scan(abs, rel.clone()).await?;
            Ok(Some(Scanned::Directory {
                path: rel,
                stats: stat.stats(),
                children,
            }))
        } else if stat.is_file {
            Ok(Some(Scanned::File {
                path: rel,
                stats: stat.stats(),
            }))
        } else {
            trace!(path = %abs.display(), "Skipping special file");
            Ok(None)
        }
    }

    /// Build and seal the tree, returning the root hash.
    pub async fn compute_root(&self) -> Result<Hash, TreeError> {
        let mut tree = self.build().await?;
        seal(self.fs, &self.root, &mut tree).await?;
        let root = tree.root();
        tree[root]
            .hash()
            .map(str::to_string)
            .ok_or_else(|| TreeError::Unsealed(String::new()))
    }
}

fn attach(tree: &mut Tree, parent: EntryId, scanned: Vec<Scanned>) -> Result<(), TreeError> {
    for entry in scanned {
        match entry {
            Scanned::File { path, stats } => {
                tree.add_file(parent, FileEntry::new(path, stats))?;
            }
            Scanned::Directory {
                path,
                stats,
                children,
            } => {
                let id = tree.add_directory(parent, path, stats)?;
                attach(tree, id, children)?;
                tree.sum_directory_size(id);
            }
        }
    }
    Ok(())
}

/// Snapshot the directory at `dir_path` with the given ignore rules.
pub async fn construct_tree(
    fs: &dyn FileSystem,
    dir_path: &Path,
    rules: IgnoreRules,
) -> Result<Tree, TreeError> {
    TreeBuilder::new(fs, dir_path)
        .with_ignore_rules(rules)
        .build()
        .await
}

/// Assign every file its content hash and recompute all directories.
///
/// File paths are resolved against `root`. Hashes are written only after
/// every file was read, so a read failure leaves `tree` unchanged.
#[instrument(skip_all, fields(root = %root.display()))]
pub async fn seal(fs: &dyn FileSystem, root: &Path, tree: &mut Tree) -> Result<(), TreeError> {
    let start = Instant::now();
    let mut files = Vec::new();
    collect_files(tree, tree.root(), &mut files);

    let hashed: Vec<(EntryId, Hash)> = stream::iter(files)
        .map(|(id, rel)| async move {
            let abs = path::resolve(root, &rel);
            let hash = fs
                .partial_content_hash(&abs)
                .await
                .map_err(|e| TreeError::io(&abs, e))?;
            Ok::<_, TreeError>((id, hash))
        })
        .buffered(SEAL_CONCURRENCY)
        .try_collect()
        .await?;

    let file_count = hashed.len();
    for (id, hash) in hashed {
        tree.set_file_hash(id, hash)?;
    }
    let root_id = tree.root();
    tree.recompute_all(root_id)?;

    info!(
        file_count,
        duration_ms = start.elapsed().as_millis(),
        "Tree sealed"
    );
    Ok(())
}

fn collect_files(tree: &Tree, id: EntryId, out: &mut Vec<(EntryId, String)>) {
    for &child in tree.children(id) {
        match &tree[child] {
            Entry::File(f) => out.push((child, f.path.clone())),
            Entry::Directory(_) => collect_files(tree, child, out),
        }
    }
}
