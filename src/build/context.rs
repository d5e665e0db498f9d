//! Build context containing the resolved layout and flags for a build.

use crate::build::{BuildFlags, PathSet};
use crate::config::BuilderConfig;
use std::path::Path;

/// Everything a pipeline run needs besides its collaborators.
///
/// The context is created once at startup and shared read-only by every run.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Resolved directory layout
    paths: PathSet,
    /// Command-line flags
    flags: BuildFlags,
    /// Top-level payload entries with this prefix are not copied
    exclude_prefix: String,
}

impl BuildContext {
    /// Create a new build context.
    pub fn new(paths: PathSet, flags: BuildFlags, exclude_prefix: impl Into<String>) -> Self {
        Self { paths, flags, exclude_prefix: exclude_prefix.into() }
    }

    /// Create a context from a loaded configuration.
    ///
    /// # Arguments
    /// - `base_dir` - Directory all relative config paths resolve against
    /// - `config` - The loaded configuration
    /// - `flags` - Flags parsed from the command line
    pub fn from_config(base_dir: &Path, config: &BuilderConfig, flags: BuildFlags) -> Self {
        Self::new(
            PathSet::from_config(base_dir, config),
            flags,
            config.payload.exclude_prefix.clone(),
        )
    }

    pub fn paths(&self) -> &PathSet {
        &self.paths
    }

    pub fn flags(&self) -> BuildFlags {
        self.flags
    }

    /// Whether the bundle is minified.
    pub fn is_production(&self) -> bool {
        self.flags.production
    }

    pub fn exclude_prefix(&self) -> &str {
        &self.exclude_prefix
    }
}
