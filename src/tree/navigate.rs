//! Traversal and query helpers over a [`Tree`].

use crate::tree::node::{Entry, Tree};
use crate::tree::path;
use crate::types::EntryId;
use std::collections::BTreeMap;

impl Tree {
    /// Find the entry at `path`.
    ///
    /// The empty path is the root. Otherwise the first entry found in a
    /// depth-first pre-order walk whose path matches exactly is returned.
    pub fn find(&self, path: &str) -> Option<EntryId> {
        if self.entry(self.root()).path() == path {
            return Some(self.root());
        }
        self.find_below(self.root(), path)
    }

    /// Like [`Tree::find`], but falls back to the first entry whose path is
    /// canonically equivalent (same NFC form) when no exact match exists.
    pub fn find_equivalent(&self, entry_path: &str) -> Option<EntryId> {
        self.find(entry_path).or_else(|| {
            let wanted = path::nfc(entry_path);
            let mut found = None;
            self.walk(self.root(), |id, entry, _, _| {
                if found.is_none() && path::nfc(entry.path()) == wanted {
                    found = Some(id);
                }
            });
            found
        })
    }

    fn find_below(&self, dir: EntryId, path: &str) -> Option<EntryId> {
        for &child in self.children(dir) {
            if self[child].path() == path {
                return Some(child);
            }
            if self[child].is_directory() {
                if let Some(found) = self.find_below(child, path) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Depth-first pre-order walk over everything below `dir`.
    ///
    /// `visit` receives each entry with its index and the number of siblings
    /// in its own parent's child list. A directory's children are visited
    /// right after the directory itself.
    pub fn walk<F>(&self, dir: EntryId, mut visit: F)
    where
        F: FnMut(EntryId, &Entry, usize, usize),
    {
        self.walk_inner(dir, &mut visit);
    }

    fn walk_inner<F>(&self, dir: EntryId, visit: &mut F)
    where
        F: FnMut(EntryId, &Entry, usize, usize),
    {
        let children = self.children(dir);
        let count = children.len();
        for (index, &child) in children.iter().enumerate() {
            let entry = &self[child];
            visit(child, entry, index, count);
            if entry.is_directory() {
                self.walk_inner(child, visit);
            }
        }
    }

    /// Remove every entry matching `predicate`, at every level.
    ///
    /// Survivors keep their relative order and every surviving directory is
    /// searched too. A removed directory takes its whole subtree with it.
    /// The root itself is never tested. Directory sizes and hashes are left
    /// as they were; recompute them if the tree is committed afterwards.
    pub fn remove<P>(&mut self, mut predicate: P) -> usize
    where
        P: FnMut(&Entry) -> bool,
    {
        let root = self.root();
        self.remove_inner(root, &mut predicate)
    }

    fn remove_inner<P>(&mut self, dir: EntryId, predicate: &mut P) -> usize
    where
        P: FnMut(&Entry) -> bool,
    {
        let children = self.children(dir).to_vec();
        let mut kept = Vec::with_capacity(children.len());
        let mut removed = 0;
        for child in children {
            if predicate(&self[child]) {
                self.release(child);
                removed += 1;
            } else {
                kept.push(child);
            }
        }
        self.set_children(dir, kept.clone());

        for child in kept {
            if self[child].is_directory() {
                removed += self.remove_inner(child, predicate);
            }
        }
        removed
    }

    /// Map entry paths to entries.
    ///
    /// With `entire_hierarchy` every descendant of the root is visited and
    /// directories are included only when `include_dirs` is set. Without it
    /// only the root's direct children are considered and only files are
    /// included; `include_dirs` has no effect in that mode.
    pub fn get_all_tree_files(
        &self,
        entire_hierarchy: bool,
        include_dirs: bool,
    ) -> BTreeMap<String, EntryId> {
        let mut files = BTreeMap::new();
        if entire_hierarchy {
            self.walk(self.root(), |id, entry, _, _| {
                if entry.is_file() || include_dirs {
                    files.insert(entry.path().to_string(), id);
                }
            });
        } else {
            for &child in self.children(self.root()) {
                if let Entry::File(f) = &self[child] {
                    files.insert(f.path.clone(), child);
                }
            }
        }
        files
    }
}
