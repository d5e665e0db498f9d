//! Working directory staging and raw payload copy.
//!
//! Staging is destructive: the build root, every distribution root and the
//! scratch root are removed without confirmation before being recreated.

use crate::build::{copy_tree_filtered, BuildContext, PathSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Filesystem failure during staging, payload copy or fan-out.
#[derive(Debug, Error)]
pub enum StageError {
    /// A directory or file could not be removed
    #[error("failed to remove {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A directory could not be created
    #[error("failed to create {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A file could not be copied
    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Directory traversal failed
    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Wipes and recreates the working directories.
#[derive(Debug, Clone, Copy)]
pub struct StagingManager<'a> {
    paths: &'a PathSet,
}

impl<'a> StagingManager<'a> {
    pub fn new(paths: &'a PathSet) -> Self {
        Self { paths }
    }

    /// Remove the build root, every distribution root and the scratch root,
    /// then recreate the scratch root, the build root and the build styles
    /// directory.
    ///
    /// Idempotent: the end state is the same whether the tree was absent or
    /// already staged.
    pub fn prepare(&self) -> Result<(), StageError> {
        remove_if_present(self.paths.build_root())?;
        for target in self.paths.targets() {
            remove_if_present(target.output_root())?;
        }
        remove_if_present(self.paths.temp_root())?;

        ensure_dir(self.paths.temp_root())?;
        ensure_dir(self.paths.build_root())?;
        ensure_dir(self.paths.build_styles())?;

        debug!(build = %self.paths.build_root().display(), "staged working directories");
        Ok(())
    }
}

/// Copy the raw extension payload into the build root.
///
/// Top-level entries whose name starts with the context's exclude prefix are
/// left behind; everything else is copied byte-for-byte. Returns the number of
/// files copied.
pub fn copy_payload(context: &BuildContext) -> Result<usize, StageError> {
    let paths = context.paths();
    let prefix = context.exclude_prefix();

    copy_tree_filtered(paths.extension_dir(), paths.build_root(), |entry| {
        entry.depth() != 1 || !entry.file_name().to_string_lossy().starts_with(prefix)
    })
}

/// Remove a directory tree (or a stray file) if it exists.
pub fn remove_if_present(path: &Path) -> Result<(), StageError> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(source) => return Err(StageError::Remove { path: path.to_path_buf(), source }),
    };

    let result =
        if metadata.is_dir() { fs::remove_dir_all(path) } else { fs::remove_file(path) };

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StageError::Remove { path: path.to_path_buf(), source }),
    }
}

/// Create a directory and its parents.
pub fn ensure_dir(path: &Path) -> Result<(), StageError> {
    fs::create_dir_all(path).map_err(|source| StageError::Create { path: path.to_path_buf(), source })
}
