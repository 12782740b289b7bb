//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/configdb/configdb.toml`
//! 3. Settings file: `--config <file>` or `$CONFIGDB_SETTINGS`
//! 4. Environment variables: `CONFIGDB_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::{ApplicationError, Format};
use crate::domain::expand_env_vars;

/// Unified configuration for configdb.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Node store file (default: ~/.configdb/nodes.json)
    pub store_path: PathBuf,
    /// Encoding used when a command names none (default: json)
    pub default_format: Format,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            default_format: Format::Json,
        }
    }
}

/// Raw settings for intermediate parsing (`None` = not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub store_path: Option<PathBuf>,
    pub default_format: Option<Format>,
}

/// Get the default store file (~/.configdb/nodes.json).
fn default_store_path() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".configdb").join("nodes.json"))
        .unwrap_or_else(|| PathBuf::from("~/.configdb/nodes.json"))
}

/// Get the XDG config directory for configdb.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "configdb").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("configdb.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.store_path.to_string_lossy().as_ref());
        self.store_path = PathBuf::from(expanded);
    }

    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            store_path: overlay
                .store_path
                .clone()
                .unwrap_or_else(|| self.store_path.clone()),
            default_format: overlay.default_format.unwrap_or(self.default_format),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `settings_file` - Optional explicit settings file; it must exist
    pub fn load(settings_file: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Explicit settings file
        if let Some(path) = settings_file {
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        // 4. Environment variables (explicit override)
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();

        Ok(current)
    }

    /// Apply CONFIGDB_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("CONFIGDB").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("store_path") {
            settings.store_path = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("default_format") {
            settings.default_format = val.parse().map_err(|e: ApplicationError| {
                ApplicationError::Config {
                    message: format!("CONFIGDB_DEFAULT_FORMAT: {}", e),
                }
            })?;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# configdb configuration
#
# Locations (by precedence, lowest to highest):
#   Global:   ~/.config/configdb/configdb.toml
#   Settings: file given by --config or $CONFIGDB_SETTINGS
#   Env:      CONFIGDB_* environment variables (explicit overrides)

# File holding the node tree
# store_path = "~/.configdb/nodes.json"

# Encoding when none is requested: json, yaml, toml, prop, value
# default_format = "json"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
