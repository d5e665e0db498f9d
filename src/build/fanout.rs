//! Distribution fan-out.
//!
//! Replicates the compiled build root into every distribution target before
//! any platform-specific patching happens.

use crate::build::{ensure_dir, DistributionTarget, StageError};
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Recursively copy `src` into `dst`, byte-for-byte.
///
/// Returns the number of files copied.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<usize, StageError> {
    copy_tree_filtered(src, dst, |_| true)
}

/// Recursively copy `src` into `dst`, skipping entries rejected by `filter`.
///
/// A rejected directory is not descended into. Entry depth is relative to
/// `src` (its direct children have depth 1).
pub fn copy_tree_filtered<F>(src: &Path, dst: &Path, filter: F) -> Result<usize, StageError>
where
    F: FnMut(&DirEntry) -> bool,
{
    ensure_dir(dst)?;

    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1).follow_links(true).into_iter().filter_entry(filter)
    {
        let entry = entry.map_err(|source| StageError::Walk { path: src.to_path_buf(), source })?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                ensure_dir(parent)?;
            }
            fs::copy(entry.path(), &target).map_err(|source| StageError::Copy {
                from: entry.path().to_path_buf(),
                to: target.clone(),
                source,
            })?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Copy the build root into every target's output root.
///
/// Immediately afterwards every target tree is identical to the build root
/// and to each other. Returns the number of files copied per target.
pub fn fan_out(build_root: &Path, targets: &[DistributionTarget]) -> Result<usize, StageError> {
    let mut per_target = 0;
    for target in targets {
        per_target = copy_tree(build_root, target.output_root())?;
        debug!(target = %target.name, files = per_target, "copied build root");
    }
    Ok(per_target)
}
