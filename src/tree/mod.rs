//! Directory snapshot trees
//!
//! A [`Tree`](node::Tree) captures a directory as an ordered hierarchy of
//! file and directory entries. File hashes come from (partial) content,
//! directory hashes from the ordered hashes of their children.

pub mod builder;
pub mod detect;
pub mod hasher;
pub mod merge;
pub mod navigate;
pub mod node;
pub mod path;
pub mod serialize;
pub mod status;

pub use builder::{construct_tree, seal, TreeBuilder};
pub use detect::{is_file_modified, ChangeDetector, FileModification};
pub use merge::merge;
pub use node::{DirectoryEntry, Entry, FileEntry, Stats, Tree};
pub use status::{compute_status, StatusReport};
