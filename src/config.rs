//! Configuration System
//!
//! Layered configuration: built-in defaults, the user's global file, the
//! workspace files under `.snaptree/` and finally `SNAPTREE__*` environment
//! variables. Later layers win.

use crate::ignore::IgnoreRules;
use crate::logging::LoggingConfig;
use crate::types::DetectionMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapConfig {
    /// Workspace root path (defaults to the directory the loader was given)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Change detection settings
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Names skipped while walking
    #[serde(default)]
    pub walk: IgnoreRules,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionConfig {
    #[serde(default)]
    pub mode: DetectionMode,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Walk(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Walk(msg) => write!(f, "Walk: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl SnapConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.walk.validate() {
            errors.push(ValidationError::Walk(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
