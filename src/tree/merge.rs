//! Merging two snapshots into a new one
//!
//! `merge(source, target)` is a union of both trees in which `target` wins
//! wherever both hold an entry at the same path. Directories present on both
//! sides are merged recursively instead of being replaced wholesale. Inputs
//! are only read; the result is built in a fresh tree.

use crate::error::TreeError;
use crate::tree::node::{Entry, Tree};
use crate::types::EntryId;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Where a merged child comes from.
#[derive(Debug, Clone, Copy)]
enum Origin {
    Source(EntryId),
    Target(EntryId),
    /// Same path on both sides, both directories.
    Both(EntryId, EntryId),
}

/// Merge `source` and `target` into a new tree.
///
/// Both inputs must be sealed. Every directory of the result has its size
/// and hash recomputed from its final children.
#[instrument(skip_all)]
pub fn merge(source: &Tree, target: &Tree) -> Result<Tree, TreeError> {
    let start = Instant::now();
    source.ensure_sealed()?;
    target.ensure_sealed()?;

    let mut out = target.empty_like();
    let out_root = out.root();
    merge_directories(source, source.root(), target, target.root(), &mut out, out_root)?;

    info!(
        entry_count = out.len(),
        root_hash = out[out_root].hash().unwrap_or_default(),
        duration_ms = start.elapsed().as_millis(),
        "Merge completed"
    );
    Ok(out)
}

/// Ordered association of child path to origin. Source children are
/// inserted first; a target child with the same path takes over the slot
/// without moving it.
fn associate(source: &Tree, src_dir: EntryId, target: &Tree, tgt_dir: EntryId) -> Vec<Origin> {
    let mut slots: Vec<Origin> = Vec::new();
    let mut by_path: HashMap<&str, usize> = HashMap::new();

    for &child in source.children(src_dir) {
        let path = source[child].path();
        match by_path.get(path) {
            Some(&i) => slots[i] = Origin::Source(child),
            None => {
                by_path.insert(path, slots.len());
                slots.push(Origin::Source(child));
            }
        }
    }

    for &child in target.children(tgt_dir) {
        let path = target[child].path();
        match by_path.get(path) {
            Some(&i) => {
                slots[i] = match slots[i] {
                    Origin::Source(s)
                        if source[s].is_directory() && target[child].is_directory() =>
                    {
                        Origin::Both(s, child)
                    }
                    _ => Origin::Target(child),
                };
            }
            None => {
                by_path.insert(path, slots.len());
                slots.push(Origin::Target(child));
            }
        }
    }

    slots
}

fn merge_directories(
    source: &Tree,
    src_dir: EntryId,
    target: &Tree,
    tgt_dir: EntryId,
    out: &mut Tree,
    dest_dir: EntryId,
) -> Result<(), TreeError> {
    for origin in associate(source, src_dir, target, tgt_dir) {
        match origin {
            Origin::Source(id) => adopt(source, id, out, dest_dir)?,
            Origin::Target(id) => adopt(target, id, out, dest_dir)?,
            Origin::Both(s, t) => match &target[t] {
                Entry::Directory(d) => {
                    debug!(path = %d.path, "Merging directory present on both sides");
                    let merged = out.push(Entry::Directory(d.detached()), dest_dir);
                    merge_directories(source, s, target, t, out, merged)?;
                }
                Entry::File(_) => adopt(target, t, out, dest_dir)?,
            },
        }
    }
    out.recompute_directory(dest_dir)
}

/// Copy one side's child into the result and recompute it from its own
/// children. Directories below it that never had a hash get one.
fn adopt(from: &Tree, id: EntryId, out: &mut Tree, dest_dir: EntryId) -> Result<(), TreeError> {
    let copy = from.copy_subtree(id, out, dest_dir);
    out.fill_missing_hashes(copy)?;
    out.recompute_directory(copy)
}
