//! Working directory status against a stored snapshot

use crate::error::TreeError;
use crate::fs::FileSystem;
use crate::ignore::IgnoreRules;
use crate::tree::builder::construct_tree;
use crate::tree::detect::ChangeDetector;
use crate::tree::node::{Stats, Tree};
use crate::types::DetectionMode;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::{info, instrument};

/// Maximum number of files checked at once.
const CHECK_CONCURRENCY: usize = 32;

/// Paths of files grouped by how they differ from the snapshot. Every list
/// is sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusReport {
    pub added: Vec<String>,
    pub deleted: Vec<String>,
    pub modified: Vec<String>,
    pub unchanged: Vec<String>,
    /// Live stats of unchanged files whose cached stats are out of date.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub refreshed: BTreeMap<String, Stats>,
}

impl StatusReport {
    /// True when nothing was added, deleted or modified.
    pub fn is_clean(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }

    /// Write the refreshed stats into `stored`, so later checks settle on
    /// metadata alone. Returns the number of files updated.
    pub fn refresh(&self, stored: &mut Tree) -> Result<usize, TreeError> {
        let mut updated = 0;
        for (path, stats) in &self.refreshed {
            if let Some(id) = stored.find(path) {
                stored.set_file_stats(id, *stats)?;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

/// Compare the files of `stored` with the live contents of `workdir`.
#[instrument(skip_all, fields(workdir = %workdir.display(), mode = %mode))]
pub async fn compute_status(
    fs: &dyn FileSystem,
    workdir: &Path,
    stored: &Tree,
    mode: DetectionMode,
    rules: IgnoreRules,
) -> Result<StatusReport, TreeError> {
    let start = Instant::now();
    let live = construct_tree(fs, workdir, rules).await?;
    let live_files = live.get_all_tree_files(true, false);
    let stored_files = stored.get_all_tree_files(true, false);

    let mut report = StatusReport::default();
    let mut shared = Vec::new();
    for (path, &id) in &stored_files {
        if live_files.contains_key(path) {
            if let Some(file) = stored[id].as_file() {
                shared.push(file);
            }
        } else {
            report.deleted.push(path.clone());
        }
    }
    report.added = live_files
        .keys()
        .filter(|path| !stored_files.contains_key(*path))
        .cloned()
        .collect();

    let detector = ChangeDetector::new(fs, workdir, mode);
    let detector = &detector;
    let checked: Vec<_> = stream::iter(shared)
        .map(|file| detector.is_file_modified(file))
        .buffered(CHECK_CONCURRENCY)
        .try_collect()
        .await?;

    for result in checked {
        let path = result.file.path;
        if result.modified {
            report.modified.push(path);
        } else {
            if result.new_stats != result.file.stats {
                report.refreshed.insert(path.clone(), result.new_stats);
            }
            report.unchanged.push(path);
        }
    }

    info!(
        added = report.added.len(),
        deleted = report.deleted.len(),
        modified = report.modified.len(),
        unchanged = report.unchanged.len(),
        refreshed = report.refreshed.len(),
        duration_ms = start.elapsed().as_millis(),
        "Status computed"
    );
    Ok(report)
}
