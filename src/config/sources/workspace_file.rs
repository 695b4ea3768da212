//! Workspace config file source: .snaptree/config.toml and .snaptree/{env}.toml

use crate::ignore::WORKSPACE_STATE_DIR;
use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::Path;

/// Add workspace config files to builder.
/// Precedence: .snaptree/config.toml (base) then .snaptree/{SNAPTREE_ENV}.toml.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let config_dir = workspace_root.join(WORKSPACE_STATE_DIR);
    let env_name = std::env::var("SNAPTREE_ENV").unwrap_or_else(|_| "development".to_string());

    let mut builder = builder;

    let base_config_path = config_dir.join("config.toml");
    if base_config_path.is_file() {
        builder = builder.add_source(File::from(base_config_path).required(false));
    }

    let env_config_path = config_dir.join(format!("{}.toml", env_name));
    if env_config_path.is_file() {
        builder = builder.add_source(File::from(env_config_path).required(false));
    }

    Ok(builder)
}
