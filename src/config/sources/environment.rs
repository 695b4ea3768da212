//! Environment source: SNAPTREE__SECTION__KEY=value

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

/// Add `SNAPTREE__*` variables to builder. List keys take comma-separated
/// values.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("SNAPTREE")
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("walk.vcs_dirs")
            .with_list_parse_key("walk.junk_files")
            .try_parsing(true),
    )
}
