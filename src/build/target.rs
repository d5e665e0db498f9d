//! Distribution target definitions.
//!
//! A distribution target is one platform-specific output tree produced from
//! the single compiled build root.

use std::path::{Path, PathBuf};

/// A distribution output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionTarget {
    /// Target name (e.g., "firefox")
    pub name: String,
    /// Absolute output root for this distribution
    pub output_root: PathBuf,
    /// Whether the vendor-prefix patch pass runs over this tree
    pub needs_patch: bool,
}

impl DistributionTarget {
    /// Create a target that receives a verbatim copy of the build root.
    pub fn verbatim(name: impl Into<String>, output_root: impl Into<PathBuf>) -> Self {
        Self { name: name.into(), output_root: output_root.into(), needs_patch: false }
    }

    /// Create a target that is patched after fan-out.
    pub fn patched(name: impl Into<String>, output_root: impl Into<PathBuf>) -> Self {
        Self { name: name.into(), output_root: output_root.into(), needs_patch: true }
    }

    /// Output root of this target.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }
}

impl std::fmt::Display for DistributionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.output_root.display())
    }
}
