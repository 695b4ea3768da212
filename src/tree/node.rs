//! Entry types and the arena that owns them
//!
//! A [`Tree`] owns every entry in a flat arena. Directories own their
//! children by [`EntryId`]; a child's parent is a plain id looked up through
//! the arena, so there is no ownership cycle between parents and children.

use crate::error::TreeError;
use crate::tree::{hasher, path};
use crate::types::{EntryId, FileMode, Hash};
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Filesystem metadata captured for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub size: u64,
    pub ctime_ms: f64,
    pub mtime_ms: f64,
}

impl Stats {
    pub fn new(size: u64, ctime_ms: f64, mtime_ms: f64) -> Self {
        Self {
            size,
            ctime_ms,
            mtime_ms,
        }
    }
}

/// Leaf entry: one file's content identity and metadata snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    /// Content hash; `None` until the file is sealed.
    pub hash: Option<Hash>,
    pub path: String,
    pub ext: String,
    pub stats: Stats,
}

impl FileEntry {
    /// Create an unsealed file entry. The extension is derived from `path`.
    pub fn new(path: impl Into<String>, stats: Stats) -> Self {
        let path = path.into();
        Self {
            hash: None,
            ext: path::extension_of(&path),
            path,
            stats,
        }
    }

    pub fn with_hash(mut self, hash: impl Into<Hash>) -> Self {
        self.hash = Some(hash.into());
        self
    }
}

/// Interior entry. `hash` and `stats.size` are derived from the children.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryEntry {
    pub hash: Option<Hash>,
    pub path: String,
    pub stats: Stats,
    children: Vec<EntryId>,
}

impl DirectoryEntry {
    pub fn new(path: impl Into<String>, stats: Stats) -> Self {
        Self {
            hash: None,
            path: path.into(),
            stats,
            children: Vec::new(),
        }
    }

    pub fn children(&self) -> &[EntryId] {
        &self.children
    }

    /// Same scalar fields, no children.
    pub(crate) fn detached(&self) -> Self {
        Self {
            hash: self.hash.clone(),
            path: self.path.clone(),
            stats: self.stats,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    File(FileEntry),
    Directory(DirectoryEntry),
}

impl Entry {
    pub fn is_file(&self) -> bool {
        matches!(self, Entry::File(_))
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Entry::Directory(_))
    }

    pub fn path(&self) -> &str {
        match self {
            Entry::File(f) => &f.path,
            Entry::Directory(d) => &d.path,
        }
    }

    pub fn hash(&self) -> Option<&str> {
        match self {
            Entry::File(f) => f.hash.as_deref(),
            Entry::Directory(d) => d.hash.as_deref(),
        }
    }

    pub fn stats(&self) -> &Stats {
        match self {
            Entry::File(f) => &f.stats,
            Entry::Directory(d) => &d.stats,
        }
    }

    pub fn file_mode(&self) -> FileMode {
        match self {
            Entry::File(_) => FileMode::Blob,
            Entry::Directory(_) => FileMode::Tree,
        }
    }

    pub fn as_file(&self) -> Option<&FileEntry> {
        match self {
            Entry::File(f) => Some(f),
            Entry::Directory(_) => None,
        }
    }

    pub fn as_directory(&self) -> Option<&DirectoryEntry> {
        match self {
            Entry::Directory(d) => Some(d),
            Entry::File(_) => None,
        }
    }
}

#[derive(Debug)]
struct Slot {
    entry: Entry,
    parent: Option<EntryId>,
}

/// A snapshot of a directory hierarchy.
///
/// The root is always a directory with an empty path. Slots of removed
/// entries are released and their ids are never reused.
#[derive(Debug)]
pub struct Tree {
    slots: Vec<Option<Slot>>,
    root: EntryId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree holding only an empty, unsealed root directory.
    pub fn new() -> Self {
        Self::with_root_stats(Stats::default())
    }

    pub fn with_root_stats(stats: Stats) -> Self {
        Self::from_root(DirectoryEntry::new("", stats))
    }

    fn from_root(root: DirectoryEntry) -> Self {
        Self {
            slots: vec![Some(Slot {
                entry: Entry::Directory(root),
                parent: None,
            })],
            root: EntryId(0),
        }
    }

    pub fn root(&self) -> EntryId {
        self.root
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.slot(id).map(|slot| &slot.entry)
    }

    /// Borrow an entry. Panics on an id that is not live in this tree.
    pub fn entry(&self, id: EntryId) -> &Entry {
        match self.get(id) {
            Some(entry) => entry,
            None => panic!("stale entry id {}", id),
        }
    }

    pub fn parent(&self, id: EntryId) -> Option<EntryId> {
        self.slot(id).and_then(|slot| slot.parent)
    }

    /// Children of a directory in listing order; empty for files.
    pub fn children(&self, id: EntryId) -> &[EntryId] {
        match self.get(id) {
            Some(Entry::Directory(d)) => &d.children,
            _ => &[],
        }
    }

    /// Number of live entries, root included.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    /// Attach a file under `parent`.
    pub fn add_file(&mut self, parent: EntryId, file: FileEntry) -> Result<EntryId, TreeError> {
        self.attach(parent, Entry::File(file))
    }

    /// Attach an empty directory under `parent`.
    pub fn add_directory(
        &mut self,
        parent: EntryId,
        path: impl Into<String>,
        stats: Stats,
    ) -> Result<EntryId, TreeError> {
        self.attach(parent, Entry::Directory(DirectoryEntry::new(path, stats)))
    }

    fn attach(&mut self, parent: EntryId, entry: Entry) -> Result<EntryId, TreeError> {
        if entry.path().is_empty() {
            return Err(TreeError::InvariantViolation(
                "non-root entry must have a path".to_string(),
            ));
        }
        match self.get(parent) {
            Some(Entry::Directory(_)) => {}
            Some(Entry::File(f)) => return Err(TreeError::NotADirectory(f.path.clone())),
            None => {
                return Err(TreeError::InvariantViolation(format!(
                    "parent {} is not part of this tree",
                    parent
                )))
            }
        }
        Ok(self.push(entry, parent))
    }

    /// Append without validation. Callers guarantee `parent` is a live directory.
    pub(crate) fn push(&mut self, entry: Entry, parent: EntryId) -> EntryId {
        let id = EntryId(self.slots.len());
        self.slots.push(Some(Slot {
            entry,
            parent: Some(parent),
        }));
        if let Some(Entry::Directory(d)) = self.get_mut(parent) {
            d.children.push(id);
        }
        id
    }

    fn slot(&self, id: EntryId) -> Option<&Slot> {
        self.slots.get(id.0).and_then(|slot| slot.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        self.slots
            .get_mut(id.0)
            .and_then(|slot| slot.as_mut())
            .map(|slot| &mut slot.entry)
    }

    /// Record a file's content hash.
    pub fn set_file_hash(&mut self, id: EntryId, hash: impl Into<Hash>) -> Result<(), TreeError> {
        match self.get_mut(id) {
            Some(Entry::File(f)) => {
                f.hash = Some(hash.into());
                Ok(())
            }
            Some(Entry::Directory(d)) => Err(TreeError::InvalidPath(format!(
                "{:?} is a directory; its hash is derived",
                d.path
            ))),
            None => Err(TreeError::InvariantViolation(format!("unknown entry {}", id))),
        }
    }

    /// Replace a file's cached stats, e.g. with the live stats returned by
    /// the change detector.
    pub fn set_file_stats(&mut self, id: EntryId, stats: Stats) -> Result<(), TreeError> {
        match self.get_mut(id) {
            Some(Entry::File(f)) => {
                f.stats = stats;
                Ok(())
            }
            Some(Entry::Directory(d)) => Err(TreeError::InvalidPath(format!(
                "{:?} is a directory; its size is derived",
                d.path
            ))),
            None => Err(TreeError::InvariantViolation(format!("unknown entry {}", id))),
        }
    }

    pub(crate) fn set_children(&mut self, id: EntryId, children: Vec<EntryId>) {
        if let Some(Entry::Directory(d)) = self.get_mut(id) {
            d.children = children;
        }
    }

    /// Release the slots of `id` and everything below it.
    pub(crate) fn release(&mut self, id: EntryId) {
        let children = self.children(id).to_vec();
        for child in children {
            self.release(child);
        }
        if let Some(slot) = self.slots.get_mut(id.0) {
            *slot = None;
        }
    }

    /// True when every file in the tree carries a content hash.
    pub fn is_sealed(&self) -> bool {
        self.ensure_sealed().is_ok()
    }

    /// Fail with the path of the first file lacking a content hash.
    pub fn ensure_sealed(&self) -> Result<(), TreeError> {
        match self
            .live_entries()
            .find(|(_, entry)| entry.is_file() && entry.hash().is_none())
        {
            Some((_, entry)) => Err(TreeError::Unsealed(entry.path().to_string())),
            None => Ok(()),
        }
    }

    fn live_entries(&self) -> impl Iterator<Item = (EntryId, &Entry)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|s| (EntryId(i), &s.entry)))
    }

    /// Check the path/parent invariant of one entry.
    pub fn check_invariant(&self, id: EntryId) -> Result<(), TreeError> {
        let slot = self
            .slot(id)
            .ok_or_else(|| TreeError::InvariantViolation(format!("unknown entry {}", id)))?;
        let path = slot.entry.path();
        match (path.is_empty(), slot.parent) {
            (true, None) | (false, Some(_)) => Ok(()),
            (false, None) => Err(TreeError::InvariantViolation(format!(
                "entry {:?} has a path but no parent",
                path
            ))),
            (true, Some(_)) => Err(TreeError::InvariantViolation(
                "entry has a parent but an empty path".to_string(),
            )),
        }
    }

    /// Compute the size and hash a directory should have from its current
    /// children, without writing them.
    ///
    /// A child directory whose hash was never computed is aggregated from its
    /// own children first. A file without a hash is an error.
    pub fn derived_size_and_hash(&self, id: EntryId) -> Result<(u64, Hash), TreeError> {
        let mut size = 0u64;
        let mut hashes = Vec::with_capacity(self.children(id).len());
        for &child in self.children(id) {
            match self.entry(child) {
                Entry::File(f) => {
                    let hash = f
                        .hash
                        .clone()
                        .ok_or_else(|| TreeError::Unsealed(f.path.clone()))?;
                    size += f.stats.size;
                    hashes.push(hash);
                }
                Entry::Directory(d) => match &d.hash {
                    Some(hash) => {
                        size += d.stats.size;
                        hashes.push(hash.clone());
                    }
                    None => {
                        let (child_size, child_hash) = self.derived_size_and_hash(child)?;
                        size += child_size;
                        hashes.push(child_hash);
                    }
                },
            }
        }
        Ok((size, hasher::aggregate_hash(hashes.iter().map(String::as_str))))
    }

    /// Recompute one directory's size and hash from its children.
    pub fn recompute_directory(&mut self, id: EntryId) -> Result<(), TreeError> {
        if self.entry(id).is_file() {
            return Ok(());
        }
        let (size, hash) = self.derived_size_and_hash(id)?;
        if let Some(Entry::Directory(d)) = self.get_mut(id) {
            d.stats.size = size;
            d.hash = Some(hash);
        }
        Ok(())
    }

    /// Recompute every directory below and including `id`, deepest first.
    pub fn recompute_all(&mut self, id: EntryId) -> Result<(), TreeError> {
        if self.entry(id).is_file() {
            return Ok(());
        }
        for child in self.children(id).to_vec() {
            self.recompute_all(child)?;
        }
        self.recompute_directory(id)
    }

    /// Compute size and hash for every directory below and including `id`
    /// that has no hash yet, deepest first. Hashed directories keep theirs.
    pub(crate) fn fill_missing_hashes(&mut self, id: EntryId) -> Result<(), TreeError> {
        for child in self.children(id).to_vec() {
            self.fill_missing_hashes(child)?;
        }
        if matches!(self.get(id), Some(Entry::Directory(d)) if d.hash.is_none()) {
            self.recompute_directory(id)?;
        }
        Ok(())
    }

    /// Set a directory's size to the sum of its children's sizes, leaving
    /// the hash untouched.
    pub(crate) fn sum_directory_size(&mut self, id: EntryId) {
        let size = self
            .children(id)
            .iter()
            .map(|&child| self.entry(child).stats().size)
            .sum();
        if let Some(Entry::Directory(d)) = self.get_mut(id) {
            d.stats.size = size;
        }
    }

    /// Deep-copy the subtree at `id` into `dest`, parented to `new_parent`.
    ///
    /// The copy shares nothing with `self`. The root cannot be cloned under
    /// a parent because it has no path; clone the whole tree instead.
    pub fn clone_into(
        &self,
        id: EntryId,
        dest: &mut Tree,
        new_parent: EntryId,
    ) -> Result<EntryId, TreeError> {
        if self.entry(id).path().is_empty() {
            return Err(TreeError::InvariantViolation(
                "the root cannot be cloned under a parent".to_string(),
            ));
        }
        if !matches!(dest.get(new_parent), Some(Entry::Directory(_))) {
            return Err(TreeError::InvariantViolation(format!(
                "clone target {} is not a directory",
                new_parent
            )));
        }
        Ok(self.copy_subtree(id, dest, new_parent))
    }

    pub(crate) fn copy_subtree(&self, id: EntryId, dest: &mut Tree, new_parent: EntryId) -> EntryId {
        match self.entry(id) {
            Entry::File(f) => dest.push(Entry::File(f.clone()), new_parent),
            Entry::Directory(d) => {
                let copy = dest.push(Entry::Directory(d.detached()), new_parent);
                for &child in &d.children {
                    self.copy_subtree(child, dest, copy);
                }
                copy
            }
        }
    }

    /// A tree whose root carries the scalar fields of this tree's root and
    /// no children.
    pub(crate) fn empty_like(&self) -> Tree {
        match self.entry(self.root) {
            Entry::Directory(d) => Tree::from_root(d.detached()),
            Entry::File(_) => Tree::new(),
        }
    }
}

impl Clone for Tree {
    /// Deep copy from the root. Released slots are not carried over.
    fn clone(&self) -> Self {
        let mut out = self.empty_like();
        let dest_root = out.root;
        for &child in self.children(self.root) {
            self.copy_subtree(child, &mut out, dest_root);
        }
        out
    }
}

/// Structural equality: same entries in the same order. Entry ids are not
/// compared, so a tree equals its clone even after removals.
impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.subtree_eq(self.root, other, other.root)
    }
}

impl Tree {
    fn subtree_eq(&self, id: EntryId, other: &Tree, other_id: EntryId) -> bool {
        match (self.entry(id), other.entry(other_id)) {
            (Entry::File(a), Entry::File(b)) => a == b,
            (Entry::Directory(a), Entry::Directory(b)) => {
                a.hash == b.hash
                    && a.path == b.path
                    && a.stats == b.stats
                    && a.children.len() == b.children.len()
                    && a
                        .children
                        .iter()
                        .zip(&b.children)
                        .all(|(&x, &y)| self.subtree_eq(x, other, y))
            }
            _ => false,
        }
    }
}

impl Index<EntryId> for Tree {
    type Output = Entry;

    fn index(&self, id: EntryId) -> &Entry {
        self.entry(id)
    }
}
