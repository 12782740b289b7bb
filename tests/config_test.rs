//! Integration tests for Settings loading from an explicit settings file.
//!
//! These tests use temp directories only; an explicit settings file sits
//! above the global config, so its values win regardless of the machine.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use configdb::application::{ApplicationError, Format};
use configdb::config::Settings;

#[test]
fn given_settings_file_when_load_then_file_values_win() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("tree.json");
    let settings_file = dir.path().join("configdb.toml");
    fs::write(
        &settings_file,
        format!(
            "store_path = \"{}\"\ndefault_format = \"yaml\"\n",
            store.display()
        ),
    )
    .unwrap();

    // Act
    let settings = Settings::load(Some(&settings_file)).expect("load settings");

    // Assert
    assert_eq!(settings.store_path, store);
    assert_eq!(settings.default_format, Format::Yaml);
}

#[test]
fn given_settings_file_with_tilde_when_load_then_store_path_is_expanded() {
    let dir = TempDir::new().unwrap();
    let settings_file = dir.path().join("configdb.toml");
    fs::write(&settings_file, "store_path = \"~/cfg/nodes.json\"\n").unwrap();

    let settings = Settings::load(Some(&settings_file)).expect("load settings");

    let home = PathBuf::from(std::env::var("HOME").expect("HOME should be set"));
    assert_eq!(settings.store_path, home.join("cfg/nodes.json"));
}

#[test]
fn given_missing_settings_file_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();

    let result = Settings::load(Some(&dir.path().join("absent.toml")));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_unknown_format_in_settings_file_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    let settings_file = dir.path().join("configdb.toml");
    fs::write(&settings_file, "default_format = \"xml\"\n").unwrap();

    let result = Settings::load(Some(&settings_file));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_template_when_parsed_then_is_valid_toml() {
    let template = Settings::template();

    let parsed: toml::Table = toml::from_str(&template).expect("template parses");

    // everything is commented out
    assert!(parsed.is_empty());
}
