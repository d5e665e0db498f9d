//! Single-flight build lock.
//!
//! At most one build runs at a time. A trigger that finds the lock held is
//! dropped; nothing is queued.

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

/// State of the build lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Idle,
    Building,
}

impl std::fmt::Display for BuildState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildState::Idle => write!(f, "idle"),
            BuildState::Building => write!(f, "building"),
        }
    }
}

/// Process-wide `Idle`/`Building` flag.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct BuildLock {
    building: Arc<AtomicBool>,
}

impl BuildLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BuildState {
        if self.building.load(Ordering::Acquire) {
            BuildState::Building
        } else {
            BuildState::Idle
        }
    }

    /// Move from `Idle` to `Building`.
    ///
    /// Returns `None` if a build is already running. The check and the set are
    /// a single compare-and-swap.
    pub fn try_acquire(&self) -> Option<BuildGuard> {
        self.building
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BuildGuard { building: Arc::clone(&self.building), scratch: None })
    }
}

/// Held for the duration of one build.
///
/// Dropping the guard removes the registered scratch directory and returns the
/// lock to `Idle`, on success, error and unwinding alike.
#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct BuildGuard {
    building: Arc<AtomicBool>,
    scratch: Option<PathBuf>,
}

impl BuildGuard {
    /// Remove `path` when the guard is released.
    pub fn remove_on_release(&mut self, path: impl Into<PathBuf>) {
        self.scratch = Some(path.into());
    }
}

impl Drop for BuildGuard {
    fn drop(&mut self) {
        if let Some(scratch) = self.scratch.take() {
            match std::fs::remove_dir_all(&scratch) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %scratch.display(), error = %e, "failed to remove scratch directory")
                }
            }
        }
        self.building.store(false, Ordering::Release);
    }
}
