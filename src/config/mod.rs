//! Configuration module for the extension builder
//!
//! Provides types and loading for the optional `extbuild.toml` project file.

pub mod loader;
pub mod schema;

pub use loader::{default_config, find_config, load_config, ConfigError, CONFIG_FILE_NAME};
pub use schema::*;
