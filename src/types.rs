//! Core types for the snapshot engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hex-encoded BLAKE3 digest.
pub type Hash = String;

/// Index of an entry inside a [`crate::tree::node::Tree`] arena.
///
/// Ids are only meaningful for the tree that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(crate) usize);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Files at or above this size are never re-hashed under
/// [`DetectionMode::SizeAndHashForSmallFiles`].
pub const SMALL_FILE_THRESHOLD: u64 = 20 * 1024 * 1024;

/// Object mode tags. The numeric values are persisted and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum FileMode {
    Tree = 16384,
    Blob = 33188,
    Executable = 33261,
    Link = 40960,
    Commit = 57344,
}

impl FileMode {
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for FileMode {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            16384 => Ok(FileMode::Tree),
            33188 => Ok(FileMode::Blob),
            33261 => Ok(FileMode::Executable),
            40960 => Ok(FileMode::Link),
            57344 => Ok(FileMode::Commit),
            other => Err(other),
        }
    }
}

/// How much evidence the change detector needs before declaring a file modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum DetectionMode {
    /// Size and mtime only. Never reads file content.
    OnlySizeAndMktime = 1,
    /// Re-hash files below [`SMALL_FILE_THRESHOLD`] when their mtime moved.
    #[default]
    SizeAndHashForSmallFiles = 2,
    /// Re-hash every file whose mtime moved.
    SizeAndHashForAllFiles = 3,
}

impl DetectionMode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<u8> for DetectionMode {
    /// Unknown values fall back to the most thorough policy.
    fn from(value: u8) -> Self {
        match value {
            1 => DetectionMode::OnlySizeAndMktime,
            2 => DetectionMode::SizeAndHashForSmallFiles,
            _ => DetectionMode::SizeAndHashForAllFiles,
        }
    }
}

impl fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DetectionMode::OnlySizeAndMktime => "only-size-and-mktime",
            DetectionMode::SizeAndHashForSmallFiles => "size-and-hash-for-small-files",
            DetectionMode::SizeAndHashForAllFiles => "size-and-hash-for-all-files",
        };
        f.write_str(name)
    }
}
