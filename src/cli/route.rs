//! CLI route: single route table and run context. Dispatches to the tree
//! modules and output formatting.

use crate::cli::output::{format_listing, format_status_text};
use crate::cli::parse::{Commands, StatusFormat};
use crate::config::{ConfigLoader, SnapConfig};
use crate::error::{ApiError, TreeError};
use crate::fs::LocalFileSystem;
use crate::ignore::IgnoreRules;
use crate::tree::{compute_status, merge, path, seal, Tree, TreeBuilder};
use crate::types::DetectionMode;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::runtime::Runtime;
use tracing::{debug, info};

/// Runtime context for CLI execution: workspace, effective configuration and
/// the async runtime the tree operations run on.
pub struct RunContext {
    workspace_root: PathBuf,
    config: SnapConfig,
    fs: LocalFileSystem,
    runtime: Runtime,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Self::with_config(workspace_root, config)
    }

    /// Create run context with an already loaded configuration.
    pub fn with_config(workspace_root: PathBuf, config: SnapConfig) -> Result<Self, ApiError> {
        let workspace_root = path::canonicalize_path(&workspace_root)?;
        let runtime = Runtime::new().map_err(|e| {
            ApiError::ConfigError(format!("Failed to create async runtime: {}", e))
        })?;
        Ok(Self {
            workspace_root,
            config,
            fs: LocalFileSystem::new(),
            runtime,
        })
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let result = match command {
            Commands::Scan { output } => self.handle_scan(output.as_deref()),
            Commands::Status {
                snapshot,
                mode,
                format,
                refresh,
            } => {
                let mode = mode
                    .map(DetectionMode::from)
                    .unwrap_or(self.config.detection.mode);
                self.handle_status(snapshot, mode, *format, *refresh)
            }
            Commands::Merge {
                source,
                target,
                output,
            } => self.handle_merge(source, target, output.as_deref()),
            Commands::Ls {
                snapshot,
                shallow,
                dirs,
            } => self.handle_ls(snapshot, *shallow, *dirs),
            Commands::Find { snapshot, path } => self.handle_find(snapshot, path),
            Commands::Config => ConfigLoader::render(&self.config),
        };
        debug!(
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis(),
            "Command finished"
        );
        result
    }

    fn ignore_rules(&self) -> Result<IgnoreRules, ApiError> {
        self.config
            .walk
            .clone()
            .with_workspace_list(&self.workspace_root)
    }

    fn handle_scan(&self, output: Option<&Path>) -> Result<String, ApiError> {
        let rules = self.ignore_rules()?;
        let tree = self.runtime.block_on(async {
            let mut tree = TreeBuilder::new(&self.fs, &self.workspace_root)
                .with_ignore_rules(rules)
                .build()
                .await?;
            seal(&self.fs, &self.workspace_root, &mut tree).await?;
            Ok::<_, TreeError>(tree)
        })?;
        self.emit(&tree, output)
    }

    fn handle_status(
        &self,
        snapshot: &Path,
        mode: DetectionMode,
        format: StatusFormat,
        refresh: bool,
    ) -> Result<String, ApiError> {
        let mut stored = load_snapshot(snapshot)?;
        let rules = self.ignore_rules()?;
        let report = self.runtime.block_on(compute_status(
            &self.fs,
            &self.workspace_root,
            &stored,
            mode,
            rules,
        ))?;
        if refresh && !report.refreshed.is_empty() {
            let updated = report.refresh(&mut stored)?;
            self.emit(&stored, Some(snapshot))?;
            info!(updated, snapshot = %snapshot.display(), "Snapshot stats refreshed");
        }
        match format {
            StatusFormat::Text => Ok(format_status_text(&report)),
            StatusFormat::Json => {
                Ok(serde_json::to_string_pretty(&report).map_err(TreeError::from)?)
            }
        }
    }

    fn handle_merge(
        &self,
        source: &Path,
        target: &Path,
        output: Option<&Path>,
    ) -> Result<String, ApiError> {
        let source = load_snapshot(source)?;
        let target = load_snapshot(target)?;
        let merged = merge(&source, &target)?;
        self.emit(&merged, output)
    }

    fn handle_ls(&self, snapshot: &Path, shallow: bool, dirs: bool) -> Result<String, ApiError> {
        let tree = load_snapshot(snapshot)?;
        let entries = tree.get_all_tree_files(!shallow, dirs);
        Ok(format_listing(&entries, |id| tree[*id].is_directory()))
    }

    fn handle_find(&self, snapshot: &Path, entry_path: &str) -> Result<String, ApiError> {
        let tree = load_snapshot(snapshot)?;
        let id = tree
            .find_equivalent(path::trim_entry_path(entry_path))
            .ok_or_else(|| ApiError::NotFound(format!("{} in {}", entry_path, snapshot.display())))?;
        Ok(serde_json::to_string_pretty(&tree.view(id)).map_err(TreeError::from)?)
    }

    /// Print the snapshot, or write it to `output` and report where it went.
    fn emit(&self, tree: &Tree, output: Option<&Path>) -> Result<String, ApiError> {
        let json = tree.to_json_pretty()?;
        let Some(output) = output else {
            return Ok(json);
        };
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| TreeError::io(parent, e))?;
        }
        std::fs::write(output, json).map_err(|e| TreeError::io(output, e))?;
        let root_hash = tree[tree.root()].hash().unwrap_or_default().to_string();
        info!(output = %output.display(), root_hash = %root_hash, "Snapshot written");
        Ok(format!(
            "Snapshot written to {} (root {})",
            output.display(),
            root_hash
        ))
    }
}

fn load_snapshot(snapshot: &Path) -> Result<Tree, ApiError> {
    let json = std::fs::read_to_string(snapshot).map_err(|e| TreeError::io(snapshot, e))?;
    Ok(Tree::from_json(&json)?)
}
