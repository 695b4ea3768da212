//! snaptree: directory snapshots and change detection
//!
//! Captures a directory as an ordered tree of hashed entries, detects which
//! files changed since a snapshot was taken and merges snapshots with
//! last-writer-wins semantics.

pub mod cli;
pub mod config;
pub mod error;
pub mod fs;
pub mod ignore;
pub mod logging;
pub mod tree;
pub mod types;
