//! Run-once and watch modes
//!
//! In watch mode every filesystem notification under the watch root triggers
//! a build. There is no debouncing: bursts are absorbed by the pipeline's
//! single-flight lock, so notifications arriving mid-build are dropped.

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;
use tracing::{info, warn};

use crate::build::{BuildFlags, BuildPipeline, BuildReport};

/// Error during watch mode
#[derive(Debug, Error)]
pub enum WatchError {
    /// Failed to initialize file watcher
    #[error("Failed to initialize file watcher: {0}")]
    WatcherInit(#[source] notify::Error),
    /// Failed to add watch path
    #[error("Failed to watch path: {0}")]
    WatchPath(#[source] notify::Error),
    /// Channel receive error
    #[error("Watch channel error: {0}")]
    ChannelError(String),
    /// Watch root not found
    #[error("Watch directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),
}

/// Operating mode, fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Build once and return
    Once,
    /// Build on every change under the watch root
    Watch,
}

impl From<BuildFlags> for Mode {
    fn from(flags: BuildFlags) -> Self {
        if flags.run_once {
            Mode::Once
        } else {
            Mode::Watch
        }
    }
}

/// Drives the pipeline in run-once or watch mode.
pub struct WatchController {
    pipeline: Arc<BuildPipeline>,
    watch_root: PathBuf,
}

impl WatchController {
    pub fn new(pipeline: Arc<BuildPipeline>) -> Self {
        let watch_root = pipeline.context().paths().watch_root().to_path_buf();
        Self { pipeline, watch_root }
    }

    pub fn watch_root(&self) -> &Path {
        &self.watch_root
    }

    /// Mode selected by the pipeline's flags.
    pub fn mode(&self) -> Mode {
        Mode::from(self.pipeline.context().flags())
    }

    /// Run the pipeline exactly once on the calling thread.
    pub fn run_once(&self) -> Option<BuildReport> {
        self.pipeline.run()
    }

    /// Handle one filesystem notification.
    ///
    /// Returns the handle of the build it started, or `None` if the event is
    /// not a content change or a build is already running.
    pub fn handle_event(&self, event: &Event) -> Option<JoinHandle<BuildReport>> {
        if !is_relevant_event(&event.kind) {
            return None;
        }

        let name = event
            .paths
            .first()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!("Detected {} in {}.", describe_event(&event.kind), name);

        self.pipeline.trigger()
    }

    /// Watch for file changes and rebuild automatically.
    ///
    /// Builds once at startup, then blocks and runs until the process is
    /// interrupted.
    ///
    /// # Returns
    /// * `Err(WatchError)` if watch setup fails or the notification channel
    ///   closes
    pub fn watch(&self) -> Result<(), WatchError> {
        if !self.watch_root.exists() {
            return Err(WatchError::SourceNotFound(self.watch_root.clone()));
        }

        let (tx, rx) = channel();
        let mut watcher: RecommendedWatcher = notify::recommended_watcher(move |res| {
            // The receiver only disappears when the controller is shutting down.
            let _ = tx.send(res);
        })
        .map_err(WatchError::WatcherInit)?;
        watcher.watch(&self.watch_root, RecursiveMode::Recursive).map_err(WatchError::WatchPath)?;

        self.pipeline.trigger();
        info!("Watching for changes in '{}'...", self.watch_root.display());

        loop {
            match rx.recv() {
                Ok(Ok(event)) => {
                    self.handle_event(&event);
                }
                Ok(Err(error)) => {
                    // Watch error (non-fatal) - log but continue watching
                    warn!("Watch error: {}", error);
                }
                Err(e) => {
                    return Err(WatchError::ChannelError(e.to_string()));
                }
            }
        }
    }
}

/// Check if an event kind reflects a change to the watched tree
fn is_relevant_event(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_))
}

fn describe_event(kind: &EventKind) -> &'static str {
    match kind {
        EventKind::Create(_) => "add",
        EventKind::Modify(_) => "change",
        EventKind::Remove(_) => "unlink",
        EventKind::Access(_) => "access",
        EventKind::Any | EventKind::Other => "event",
    }
}
