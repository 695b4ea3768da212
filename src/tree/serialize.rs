//! Canonical JSON representation of trees
//!
//! Directories serialize as `{"hash", "path", "stats", "children"}` and files
//! as `{"hash", "path", "ext", "stats"}`. An unsealed hash is written as an
//! empty string and read back as unset.

use crate::error::TreeError;
use crate::tree::node::{Entry, FileEntry, Stats, Tree};
use crate::types::EntryId;
use serde::ser::{Error as _, SerializeSeq, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};

/// Serializable view of one entry and everything below it.
pub struct EntryView<'a> {
    tree: &'a Tree,
    id: EntryId,
}

impl Serialize for EntryView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.tree.check_invariant(self.id).map_err(S::Error::custom)?;

        match self.tree.entry(self.id) {
            Entry::File(f) => {
                let mut state = serializer.serialize_struct("File", 4)?;
                state.serialize_field("hash", f.hash.as_deref().unwrap_or(""))?;
                state.serialize_field("path", &f.path)?;
                state.serialize_field("ext", &f.ext)?;
                state.serialize_field("stats", &f.stats)?;
                state.end()
            }
            Entry::Directory(d) => {
                let mut state = serializer.serialize_struct("Directory", 4)?;
                state.serialize_field("hash", d.hash.as_deref().unwrap_or(""))?;
                state.serialize_field("path", &d.path)?;
                state.serialize_field("stats", &d.stats)?;
                state.serialize_field(
                    "children",
                    &ChildrenView {
                        tree: self.tree,
                        children: d.children(),
                    },
                )?;
                state.end()
            }
        }
    }
}

struct ChildrenView<'a> {
    tree: &'a Tree,
    children: &'a [EntryId],
}

impl Serialize for ChildrenView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.children.len()))?;
        for &id in self.children {
            seq.serialize_element(&EntryView {
                tree: self.tree,
                id,
            })?;
        }
        seq.end()
    }
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    hash: String,
    path: String,
    #[serde(default)]
    ext: Option<String>,
    stats: Stats,
    #[serde(default)]
    children: Option<Vec<RawEntry>>,
}

fn non_empty(hash: String) -> Option<String> {
    if hash.is_empty() {
        None
    } else {
        Some(hash)
    }
}

impl Tree {
    pub fn view(&self, id: EntryId) -> EntryView<'_> {
        EntryView { tree: self, id }
    }

    /// Compact JSON literal of the whole tree.
    pub fn to_json(&self) -> Result<String, TreeError> {
        Ok(serde_json::to_string(&self.view(self.root()))?)
    }

    pub fn to_json_pretty(&self) -> Result<String, TreeError> {
        Ok(serde_json::to_string_pretty(&self.view(self.root()))?)
    }

    /// JSON literal of a single entry and its descendants.
    pub fn entry_to_json(&self, id: EntryId) -> Result<String, TreeError> {
        Ok(serde_json::to_string(&self.view(id))?)
    }

    /// Load a tree previously written by [`Tree::to_json`].
    ///
    /// Nesting depth is unbounded; the stack grows on demand while parsing.
    pub fn from_json(json: &str) -> Result<Tree, TreeError> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        deserializer.disable_recursion_limit();
        let raw = RawEntry::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
        deserializer.end()?;
        if !raw.path.is_empty() {
            return Err(TreeError::InvariantViolation(format!(
                "root entry must have an empty path, found {:?}",
                raw.path
            )));
        }
        let children = raw.children.ok_or_else(|| {
            TreeError::InvariantViolation("root entry must be a directory".to_string())
        })?;

        let mut tree = Tree::with_root_stats(raw.stats);
        let root = tree.root();
        if let Some(Entry::Directory(d)) = tree.get_mut(root) {
            d.hash = non_empty(raw.hash);
        }
        for child in children {
            load_entry(&mut tree, root, child)?;
        }
        Ok(tree)
    }
}

fn load_entry(tree: &mut Tree, parent: EntryId, raw: RawEntry) -> Result<(), TreeError> {
    match raw.children {
        Some(children) => {
            let id = tree.add_directory(parent, raw.path, raw.stats)?;
            if let Some(Entry::Directory(d)) = tree.get_mut(id) {
                d.hash = non_empty(raw.hash);
            }
            for child in children {
                load_entry(tree, id, child)?;
            }
        }
        None => {
            let mut file = FileEntry::new(raw.path, raw.stats);
            file.hash = non_empty(raw.hash);
            if let Some(ext) = raw.ext {
                file.ext = ext;
            }
            tree.add_file(parent, file)?;
        }
    }
    Ok(())
}
