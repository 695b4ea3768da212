//! Merge rules: defaults, override order, conflict handling.

use crate::ignore::{DEFAULT_JUNK_FILES, DEFAULT_VCS_DIRS};
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// List values from a later layer replace the default list; they are not
/// appended to it.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("detection.mode", "size-and-hash-for-small-files")?
        .set_default("walk.vcs_dirs", DEFAULT_VCS_DIRS.to_vec())?
        .set_default("walk.junk_files", DEFAULT_JUNK_FILES.to_vec())?
        .set_default("logging.level", "warn")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stderr")
}
