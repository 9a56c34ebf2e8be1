//! Application configuration.
//!
//! Values are layered: built-in defaults, then the TOML file, then
//! `LIBRARY_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use ::config::{Config, Environment, File};
use anyhow::{Context, Result};
use serde::Deserialize;

use crate::store::{CatalogStore, DEFAULT_EXTENSION};

/// Directory name used under the platform config and data directories.
pub const APP_DIR: &str = "lending-library";
/// Configuration file name inside [`APP_DIR`].
pub const CONFIG_FILE: &str = "config.toml";
/// Prefix for environment overrides, e.g. `LIBRARY_LIBRARY_NAME`.
pub const ENV_PREFIX: &str = "LIBRARY";

const DEFAULT_LIBRARY_NAME: &str = "UTA Library";

const DEFAULT_CONFIG: &str = r#"# Lending library manager configuration.
# Every key is optional. LIBRARY_* environment variables override this file.

# Name of the empty catalog created at startup.
library_name = "UTA Library"

# Directory that relative catalog file names are resolved against.
# data_dir = "."

# Directory receiving library.log.
# log_dir = "logs"

# Catalog file opened at startup.
# autoload = "main.lib"

# Extension used when listing saved catalogs.
extension = "lib"
"#;

/// Settings for the manager binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Name given to the empty catalog created at startup.
    pub library_name: String,
    /// Base directory for relative catalog file names.
    pub data_dir: PathBuf,
    /// Directory for the log file.
    pub log_dir: PathBuf,
    /// Catalog opened at startup, if any.
    pub autoload: Option<PathBuf>,
    /// Extension of catalog files shown in listings.
    pub extension: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            library_name: DEFAULT_LIBRARY_NAME.to_string(),
            data_dir: PathBuf::from("."),
            log_dir: default_log_dir(),
            autoload: None,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl AppConfig {
    /// Load from the default config file location.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load using `path` as the file layer. A missing file is not an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("failed to load config {}", path.display()))?;
        settings
            .try_deserialize()
            .with_context(|| format!("invalid config {}", path.display()))
    }

    /// Store rooted at [`AppConfig::data_dir`].
    pub fn store(&self) -> CatalogStore {
        CatalogStore::new(&self.data_dir).with_extension(&self.extension)
    }
}

/// Default config file path under the user's config directory.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

/// Write the commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    ensure_default_config_at(&path)?;
    Ok(path)
}

/// [`ensure_default_config`] for an explicit path.
pub fn ensure_default_config_at(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR).join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}
