//! Path utilities for tree-relative entry paths.
//!
//! Entry paths are always slash-separated and relative to the tree root, with
//! the empty string standing for the root itself. Filesystem paths stay
//! `Path`/`PathBuf` until they are converted here.

use crate::error::TreeError;
use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Canonicalize a workspace root so relative paths are computed against a
/// stable absolute location.
pub fn canonicalize_path(path: &Path) -> Result<PathBuf, TreeError> {
    dunce::canonicalize(path).map_err(|e| TreeError::io(path, e))
}

/// Drop trailing separators from a filesystem root. Names are kept byte for
/// byte.
pub fn trim_root(path: &Path) -> PathBuf {
    path.components().collect()
}

/// Drop trailing slashes from a user-supplied entry path.
pub fn trim_entry_path(entry_path: &str) -> &str {
    entry_path.trim_end_matches('/')
}

/// NFC form of an entry path, for comparing names typed by a user with
/// names stored as they appear on disk.
pub fn nfc(entry_path: &str) -> String {
    entry_path.nfc().collect()
}

/// Join a tree-relative directory path and a child name.
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Express `path` relative to `root` as a slash-separated entry path.
pub fn relative(root: &Path, path: &Path) -> Result<String, TreeError> {
    let stripped = path.strip_prefix(root).map_err(|_| {
        TreeError::InvalidPath(format!(
            "{} is not inside {}",
            path.display(),
            root.display()
        ))
    })?;

    let mut parts = Vec::new();
    for component in stripped.components() {
        match component {
            Component::Normal(name) => parts.push(name.to_string_lossy().into_owned()),
            Component::CurDir => {}
            other => {
                return Err(TreeError::InvalidPath(format!(
                    "unexpected component {:?} in {}",
                    other,
                    path.display()
                )))
            }
        }
    }
    Ok(parts.join("/"))
}

/// Resolve a tree-relative entry path against a filesystem root.
pub fn resolve(root: &Path, entry_path: &str) -> PathBuf {
    entry_path
        .split('/')
        .filter(|part| !part.is_empty())
        .fold(root.to_path_buf(), |acc, part| acc.join(part))
}

/// Extension including the leading dot, or an empty string.
///
/// Dotfiles such as `.gitignore` have no extension.
pub fn extension_of(entry_path: &str) -> String {
    match Path::new(entry_path).extension() {
        Some(ext) => format!(".{}", ext.to_string_lossy()),
        None => String::new(),
    }
}

/// Final component of an entry path.
pub fn file_name(entry_path: &str) -> &str {
    entry_path.rsplit('/').next().unwrap_or(entry_path)
}
