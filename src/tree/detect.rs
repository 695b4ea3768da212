//! File change detection against a live working directory
//!
//! Checks run cheapest first: size, then mtime, then (depending on the
//! [`DetectionMode`]) a partial re-hash of the file content.

use crate::error::TreeError;
use crate::fs::FileSystem;
use crate::tree::node::{FileEntry, Stats};
use crate::tree::path;
use crate::types::{DetectionMode, SMALL_FILE_THRESHOLD};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, trace};

/// Mtime differences below this are treated as equal. Restoring a file sets
/// its mtime from a serialized value that may have lost sub-millisecond
/// precision.
pub const MTIME_TOLERANCE_MS: f64 = 1.0;

/// Outcome of checking one file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileModification {
    /// The captured entry that was checked.
    pub file: FileEntry,
    pub modified: bool,
    /// Stats observed on disk, for refreshing the cached snapshot.
    pub new_stats: Stats,
}

/// Decision reachable from metadata alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Modified,
    Unchanged,
    /// Metadata is inconclusive; compare content hashes.
    CompareContent,
}

/// Decide from captured and live stats whether content must be compared.
pub fn metadata_verdict(captured: &Stats, live: &Stats, mode: DetectionMode) -> Verdict {
    if captured.size != live.size {
        return Verdict::Modified;
    }
    if (captured.mtime_ms - live.mtime_ms).abs() < MTIME_TOLERANCE_MS {
        return Verdict::Unchanged;
    }
    match mode {
        DetectionMode::OnlySizeAndMktime => Verdict::Modified,
        DetectionMode::SizeAndHashForSmallFiles if live.size >= SMALL_FILE_THRESHOLD => {
            Verdict::Modified
        }
        DetectionMode::SizeAndHashForSmallFiles | DetectionMode::SizeAndHashForAllFiles => {
            Verdict::CompareContent
        }
    }
}

/// Compares captured file entries with a working directory.
pub struct ChangeDetector<'a> {
    fs: &'a dyn FileSystem,
    workdir: PathBuf,
    mode: DetectionMode,
}

impl<'a> ChangeDetector<'a> {
    pub fn new(fs: &'a dyn FileSystem, workdir: impl AsRef<Path>, mode: DetectionMode) -> Self {
        Self {
            fs,
            workdir: workdir.as_ref().to_path_buf(),
            mode,
        }
    }

    pub fn mode(&self) -> DetectionMode {
        self.mode
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Check one captured file against its live counterpart.
    ///
    /// A failing stat (e.g. the file was deleted) is returned as an error.
    /// A captured file without a hash never matches a re-hash.
    #[instrument(skip(self, file), fields(path = %file.path, mode = %self.mode))]
    pub async fn is_file_modified(&self, file: &FileEntry) -> Result<FileModification, TreeError> {
        let abs = path::resolve(&self.workdir, &file.path);
        let live = self
            .fs
            .stat(&abs)
            .await
            .map_err(|e| TreeError::io(&abs, e))?;
        let new_stats = live.stats();

        let modified = match metadata_verdict(&file.stats, &new_stats, self.mode) {
            Verdict::Modified => true,
            Verdict::Unchanged => false,
            Verdict::CompareContent => {
                let live_hash = self
                    .fs
                    .partial_content_hash(&abs)
                    .await
                    .map_err(|e| TreeError::io(&abs, e))?;
                trace!(live_hash = %live_hash, "Re-hashed file content");
                file.hash.as_deref() != Some(live_hash.as_str())
            }
        };

        debug!(modified, "Checked file");
        Ok(FileModification {
            file: file.clone(),
            modified,
            new_stats,
        })
    }
}

/// Check a single file without keeping a detector around.
pub async fn is_file_modified(
    fs: &dyn FileSystem,
    workdir: &Path,
    file: &FileEntry,
    mode: DetectionMode,
) -> Result<FileModification, TreeError> {
    ChangeDetector::new(fs, workdir, mode)
        .is_file_modified(file)
        .await
}
