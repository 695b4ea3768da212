//! CLI parse: clap types for snaptree. No behavior; definitions only.

use crate::types::DetectionMode;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// snaptree - directory snapshots and change detection
#[derive(Parser, Debug)]
#[command(name = "snaptree")]
#[command(about = "Snapshot directories, detect changes and merge snapshots")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Snapshot the workspace and print or store it as JSON
    Scan {
        /// Write the snapshot to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Compare the workspace with a stored snapshot
    Status {
        /// Snapshot file produced by `scan`
        #[arg(long)]
        snapshot: PathBuf,
        /// Detection mode (defaults to the configured one)
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: StatusFormat,
        /// Store the live stats of unchanged files back into the snapshot
        #[arg(long)]
        refresh: bool,
    },
    /// Merge two snapshots; entries of TARGET win on collisions
    Merge {
        source: PathBuf,
        target: PathBuf,
        /// Write the merged snapshot to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the paths of a snapshot
    Ls {
        snapshot: PathBuf,
        /// Only the top level
        #[arg(long)]
        shallow: bool,
        /// Include directories
        #[arg(long)]
        dirs: bool,
    },
    /// Print one entry of a snapshot
    Find { snapshot: PathBuf, path: String },
    /// Print the effective configuration
    Config,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// Size and mtime only
    Fast,
    /// Re-hash files below 20 MiB
    Small,
    /// Re-hash every candidate file
    All,
}

impl From<ModeArg> for DetectionMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Fast => DetectionMode::OnlySizeAndMktime,
            ModeArg::Small => DetectionMode::SizeAndHashForSmallFiles,
            ModeArg::All => DetectionMode::SizeAndHashForAllFiles,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusFormat {
    Text,
    Json,
}
