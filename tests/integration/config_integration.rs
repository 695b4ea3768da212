//! Integration tests for the configuration system

use super::test_utils::with_env;
use snaptree::config::{ConfigLoader, SnapConfig};
use snaptree::ignore::IgnoreRules;
use snaptree::types::DetectionMode;
use std::fs;
use tempfile::TempDir;

const CLEAR: &[(&str, Option<&str>)] = &[
    ("SNAPTREE_ENV", None),
    ("SNAPTREE__DETECTION__MODE", None),
    ("SNAPTREE__WALK__JUNK_FILES", None),
    ("SNAPTREE__LOGGING__LEVEL", None),
];

fn write_workspace_config(root: &std::path::Path, name: &str, contents: &str) {
    let dir = root.join(".snaptree");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn test_defaults_without_any_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = with_env(CLEAR, || {
        ConfigLoader::load_layers(temp_dir.path(), None).unwrap()
    });

    assert_eq!(config.detection.mode, DetectionMode::SizeAndHashForSmallFiles);
    assert_eq!(config.walk, IgnoreRules::default());
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.workspace_root.as_deref(), Some(temp_dir.path()));
}

#[test]
fn test_load_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("snaptree.toml");
    fs::write(
        &config_file,
        r#"
[detection]
mode = "size-and-hash-for-all-files"

[walk]
junk_files = ["Thumbs.db"]

[logging]
level = "debug"
format = "json"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    assert_eq!(config.detection.mode, DetectionMode::SizeAndHashForAllFiles);
    assert_eq!(config.walk.junk_files, vec!["Thumbs.db"]);
    assert_eq!(config.walk.vcs_dirs, IgnoreRules::default().vcs_dirs);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, "json");
}

#[test]
fn test_missing_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    assert!(ConfigLoader::load_from_file(&temp_dir.path().join("absent.toml")).is_err());
}

#[test]
fn test_invalid_values_fail_validation() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("bad.toml");
    fs::write(
        &config_file,
        r#"
[walk]
vcs_dirs = [""]
"#,
    )
    .unwrap();
    let err = ConfigLoader::load_from_file(&config_file).unwrap_err();
    assert!(err.to_string().contains("Walk"));
}

#[test]
fn test_layers_apply_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    let global = root.join("global.toml");
    fs::write(
        &global,
        r#"
[detection]
mode = "only-size-and-mktime"

[logging]
level = "info"
"#,
    )
    .unwrap();
    write_workspace_config(
        root,
        "config.toml",
        r#"
[logging]
level = "debug"
"#,
    );
    write_workspace_config(
        root,
        "ci.toml",
        r#"
[logging]
level = "error"
"#,
    );

    let base = with_env(CLEAR, || {
        ConfigLoader::load_layers(root, Some(&global)).unwrap()
    });
    assert_eq!(base.detection.mode, DetectionMode::OnlySizeAndMktime);
    assert_eq!(base.logging.level, "debug");

    let mut vars = CLEAR.to_vec();
    vars[0] = ("SNAPTREE_ENV", Some("ci"));
    let ci = with_env(&vars, || ConfigLoader::load_layers(root, Some(&global)).unwrap());
    assert_eq!(ci.logging.level, "error");
    assert_eq!(ci.detection.mode, DetectionMode::OnlySizeAndMktime);
}

#[test]
fn test_environment_overrides_files() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_workspace_config(
        root,
        "config.toml",
        r#"
[detection]
mode = "only-size-and-mktime"
"#,
    );

    let vars = [
        ("SNAPTREE_ENV", None),
        ("SNAPTREE__DETECTION__MODE", Some("size-and-hash-for-all-files")),
        ("SNAPTREE__WALK__JUNK_FILES", Some("desktop.ini,.DS_Store")),
        ("SNAPTREE__LOGGING__LEVEL", None),
    ];
    let config = with_env(&vars, || ConfigLoader::load_layers(root, None).unwrap());
    assert_eq!(config.detection.mode, DetectionMode::SizeAndHashForAllFiles);
    assert_eq!(config.walk.junk_files, vec!["desktop.ini", ".DS_Store"]);
}

#[test]
fn test_render_round_trips_through_toml() {
    let mut config = SnapConfig::default();
    config.detection.mode = DetectionMode::OnlySizeAndMktime;
    config.walk.junk_files = vec!["Thumbs.db".to_string()];

    let rendered = ConfigLoader::render(&config).unwrap();
    assert!(rendered.contains("mode = \"only-size-and-mktime\""));
    let parsed: SnapConfig = toml::from_str(&rendered).unwrap();
    assert_eq!(parsed, config);
}
