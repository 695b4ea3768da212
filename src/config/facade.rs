//! Entry point for loading the effective configuration.

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::SnapConfig;
use crate::error::ApiError;
use config::File;
use std::path::Path;
use tracing::debug;

/// Loads [`SnapConfig`] from its layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for `workspace_root` from every layer.
    pub fn load(workspace_root: &Path) -> Result<SnapConfig, ApiError> {
        let global = global_file::global_config_path();
        Self::load_layers(workspace_root, global.as_deref())
    }

    /// Load configuration with an explicit global file instead of the
    /// platform default.
    pub fn load_layers(
        workspace_root: &Path,
        global_config: Option<&Path>,
    ) -> Result<SnapConfig, ApiError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder, global_config)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);

        let mut config: SnapConfig = builder.build()?.try_deserialize()?;
        if config.workspace_root.is_none() {
            config.workspace_root = Some(workspace_root.to_path_buf());
        }
        Self::finish(config)
    }

    /// Load configuration from a single file on top of the defaults. No other
    /// layer is consulted.
    pub fn load_from_file(path: &Path) -> Result<SnapConfig, ApiError> {
        if !path.is_file() {
            return Err(ApiError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let config: SnapConfig = merge_policy::builder_with_defaults()?
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;
        Self::finish(config)
    }

    /// Built-in defaults only.
    pub fn default_config() -> Result<SnapConfig, ApiError> {
        let config: SnapConfig = merge_policy::builder_with_defaults()?
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Render a configuration as TOML.
    pub fn render(config: &SnapConfig) -> Result<String, ApiError> {
        toml::to_string_pretty(config)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render configuration: {}", e)))
    }

    fn finish(config: SnapConfig) -> Result<SnapConfig, ApiError> {
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        debug!(mode = %config.detection.mode, "Configuration loaded");
        Ok(config)
    }
}
