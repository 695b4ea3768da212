//! Names the tree walker never descends into or records.
//!
//! Two lists apply to every directory level: version-control metadata
//! directories (matched exactly) and files the operating system drops into
//! folders on its own (matched case-insensitively). A workspace may add its
//! own names through `.snaptree/ignore`, one name per line.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Version-control metadata directories.
pub const DEFAULT_VCS_DIRS: &[&str] = &[".git", ".snow", ".svn", ".hg"];

/// OS-generated junk files.
pub const DEFAULT_JUNK_FILES: &[&str] = &[
    ".DS_Store",
    "._.DS_Store",
    "Thumbs.db",
    "ehthumbs.db",
    "desktop.ini",
];

/// Workspace directory holding snaptree's own state; always skipped.
pub const WORKSPACE_STATE_DIR: &str = ".snaptree";

/// Skipped names for one walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IgnoreRules {
    #[serde(default = "default_vcs_dirs")]
    pub vcs_dirs: Vec<String>,
    #[serde(default = "default_junk_files")]
    pub junk_files: Vec<String>,
}

fn default_vcs_dirs() -> Vec<String> {
    DEFAULT_VCS_DIRS.iter().map(|s| (*s).to_string()).collect()
}

fn default_junk_files() -> Vec<String> {
    DEFAULT_JUNK_FILES.iter().map(|s| (*s).to_string()).collect()
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self {
            vcs_dirs: default_vcs_dirs(),
            junk_files: default_junk_files(),
        }
    }
}

impl IgnoreRules {
    /// True when a directory entry called `name` must not appear in a tree.
    pub fn should_skip(&self, name: &str) -> bool {
        name == WORKSPACE_STATE_DIR
            || self.vcs_dirs.iter().any(|d| d == name)
            || self.junk_files.iter().any(|j| j.eq_ignore_ascii_case(name))
    }

    /// Add names read from the workspace ignore list, if present.
    pub fn with_workspace_list(mut self, workspace_root: &Path) -> Result<Self, ApiError> {
        self.junk_files.extend(read_ignore_list(workspace_root)?);
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.vcs_dirs.iter().chain(&self.junk_files).any(|n| n.trim().is_empty()) {
            return Err("ignore names cannot be empty".to_string());
        }
        if self
            .vcs_dirs
            .iter()
            .chain(&self.junk_files)
            .any(|n| n.contains('/') || n.contains('\\'))
        {
            return Err("ignore names must be single path components".to_string());
        }
        Ok(())
    }
}

pub fn ignore_list_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(WORKSPACE_STATE_DIR).join("ignore")
}

/// Read the workspace ignore list. Blank lines and `#` comments are skipped;
/// a missing file yields no names.
pub fn read_ignore_list(workspace_root: &Path) -> Result<Vec<String>, ApiError> {
    let list_path = ignore_list_path(workspace_root);
    if !list_path.is_file() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(&list_path)
        .map_err(|e| ApiError::ConfigError(format!("Failed to read ignore list: {}", e)))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
