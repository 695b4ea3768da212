//! CLI output: error mapping and text presentation.

use crate::error::ApiError;
use crate::tree::StatusReport;
use std::collections::BTreeMap;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    e.to_string()
}

/// One line per changed path, prefixed like `A`, `D` or `M`. A clean
/// working directory prints a single summary line.
pub fn format_status_text(report: &StatusReport) -> String {
    if report.is_clean() {
        return format!(
            "Working directory clean ({} files unchanged)",
            report.unchanged.len()
        );
    }
    let mut lines: Vec<(&str, char)> = Vec::new();
    lines.extend(report.added.iter().map(|p| (p.as_str(), 'A')));
    lines.extend(report.deleted.iter().map(|p| (p.as_str(), 'D')));
    lines.extend(report.modified.iter().map(|p| (p.as_str(), 'M')));
    lines.sort();
    lines
        .into_iter()
        .map(|(path, tag)| format!("{} {}", tag, path))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Paths of a listing, one per line; directories get a trailing `/`.
pub fn format_listing<V>(entries: &BTreeMap<String, V>, is_dir: impl Fn(&V) -> bool) -> String {
    entries
        .iter()
        .map(|(path, v)| {
            if is_dir(v) {
                format!("{}/", path)
            } else {
                path.clone()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
