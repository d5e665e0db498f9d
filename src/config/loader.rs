//! Configuration loading and discovery for `extbuild.toml`
//!
//! The config file is optional and only looked up in the base directory.

use super::schema::BuilderConfig;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the optional config file in the base directory
pub const CONFIG_FILE_NAME: &str = "extbuild.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse extbuild.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// Find `extbuild.toml` in the base directory.
pub fn find_config(base_dir: &Path) -> Option<PathBuf> {
    let config_path = base_dir.join(CONFIG_FILE_NAME);
    if config_path.is_file() {
        Some(config_path)
    } else {
        None
    }
}

/// Load the configuration for a base directory.
///
/// Falls back to [`default_config`] when no `extbuild.toml` exists.
///
/// # Example
/// ```ignore
/// let base = std::env::current_dir()?;
/// let config = load_config(&base)?;
/// ```
pub fn load_config(base_dir: &Path) -> Result<BuilderConfig, ConfigError> {
    match find_config(base_dir) {
        Some(path) => load_config_file(&path),
        None => Ok(default_config()),
    }
}

/// Load configuration from a specific file path.
pub fn load_config_file(path: &Path) -> Result<BuilderConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: BuilderConfig = toml::from_str(&contents)?;

    let base_dir = path.parent().unwrap_or(Path::new(""));
    let errors = config.validate_in(base_dir);
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// Default configuration used when no extbuild.toml is found.
pub fn default_config() -> BuilderConfig {
    BuilderConfig::default()
}
