//! Build pipeline orchestration.
//!
//! Runs the stages in a fixed order:
//! staging, payload copy, styles, bundle, fan-out, then the patch pass over
//! every target that needs it. Staging, payload, bundle and fan-out failures
//! abort the run; style failures and per-file patch failures are absorbed.

use crate::build::{
    build_styles, compiler_for, copy_payload, fan_out, BuildContext, BuildGuard, BuildLock,
    BuildReport, BuildState, BundleError, BundleOptions, Bundler, EsbuildCli, Stage, StageError,
    StageOutcome, StagingManager, StyleCompiler, TargetPatch,
};
use crate::config::ToolsConfig;
use crate::patch::{PatchRuleSet, PlatformPatcher};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info};

/// Fatal pipeline error.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("staging failed: {0}")]
    Staging(#[source] StageError),
    #[error("payload copy failed: {0}")]
    Payload(#[source] StageError),
    #[error("bundling failed: {0}")]
    Bundle(#[from] BundleError),
    #[error("distribution fan-out failed: {0}")]
    Fanout(#[source] StageError),
}

impl BuildError {
    /// Stage that produced this error.
    pub fn stage(&self) -> Stage {
        match self {
            BuildError::Staging(_) => Stage::Staging,
            BuildError::Payload(_) => Stage::Payload,
            BuildError::Bundle(_) => Stage::Bundle,
            BuildError::Fanout(_) => Stage::Fanout,
        }
    }
}

/// Build pipeline with single-flight concurrency control.
pub struct BuildPipeline {
    /// Build context
    context: BuildContext,
    /// Stylesheet compiler
    styles: Box<dyn StyleCompiler>,
    /// Script bundler
    bundler: Box<dyn Bundler>,
    /// Rules applied to patched targets
    rules: PatchRuleSet,
    /// Idle/building state
    lock: BuildLock,
}

impl BuildPipeline {
    /// Create a pipeline with explicit collaborators and the Firefox rule set.
    pub fn new(
        context: BuildContext,
        styles: Box<dyn StyleCompiler>,
        bundler: Box<dyn Bundler>,
    ) -> Self {
        Self { context, styles, bundler, rules: PatchRuleSet::firefox(), lock: BuildLock::new() }
    }

    /// Create a pipeline that drives the external tools named in the config.
    pub fn with_tools(context: BuildContext, tools: &ToolsConfig) -> Self {
        let styles = compiler_for(context.paths().stylesheet(), tools);
        let bundler = Box::new(EsbuildCli::new(tools.esbuild.clone()));
        Self::new(context, styles, bundler)
    }

    /// Replace the patch rule set.
    pub fn with_rules(mut self, rules: PatchRuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    pub fn rules(&self) -> &PatchRuleSet {
        &self.rules
    }

    pub fn state(&self) -> BuildState {
        self.lock.state()
    }

    /// Run the pipeline on the calling thread.
    ///
    /// Returns `None` without doing anything if a build is already running.
    pub fn run(&self) -> Option<BuildReport> {
        match self.lock.try_acquire() {
            Some(guard) => Some(self.run_locked(guard)),
            None => {
                debug!("build already in progress, trigger dropped");
                None
            }
        }
    }

    /// Start the pipeline on a background thread.
    ///
    /// The lock is taken before this returns, so a second trigger issued
    /// immediately afterwards is dropped. Returns `None` if a build is already
    /// running.
    pub fn trigger(self: &Arc<Self>) -> Option<JoinHandle<BuildReport>> {
        let Some(guard) = self.lock.try_acquire() else {
            debug!("build already in progress, trigger dropped");
            return None;
        };
        let pipeline = Arc::clone(self);
        Some(std::thread::spawn(move || pipeline.run_locked(guard)))
    }

    fn run_locked(&self, mut guard: BuildGuard) -> BuildReport {
        guard.remove_on_release(self.context.paths().temp_root());

        info!("--------------------------------");
        info!("Starting build...");
        let start = Instant::now();

        let mut report = BuildReport::new();
        match self.execute(&mut report) {
            Ok(()) => info!("Build successful!"),
            Err(e) => {
                error!(stage = %e.stage(), "Build failed: {}", e);
                report.record(e.stage(), StageOutcome::Failed(e.to_string()));
                report.fail(e.to_string());
            }
        }
        report.total_duration = start.elapsed();
        info!("{}", report.summary());
        info!("--------------------------------");

        drop(guard);
        report
    }

    fn execute(&self, report: &mut BuildReport) -> Result<(), BuildError> {
        let paths = self.context.paths();

        StagingManager::new(paths).prepare().map_err(BuildError::Staging)?;
        report.record(Stage::Staging, StageOutcome::Done);

        let copied = copy_payload(&self.context).map_err(BuildError::Payload)?;
        debug!(files = copied, "copied extension payload");
        report.record(Stage::Payload, StageOutcome::Done);

        match build_styles(self.styles.as_ref(), paths.stylesheet(), &paths.style_output()) {
            Ok(_) => {
                info!("Stylesheet compiled successfully.");
                report.record(Stage::Styles, StageOutcome::Done);
            }
            Err(e) => {
                error!("Stylesheet compilation failed: {}", e);
                report.record(Stage::Styles, StageOutcome::Recovered(e.to_string()));
            }
        }

        let options = BundleOptions::browser(
            paths.entry_script(),
            paths.bundle_output(),
            self.context.is_production(),
        );
        self.bundler.bundle(&options)?;
        report.record(Stage::Bundle, StageOutcome::Done);

        fan_out(paths.build_root(), paths.targets()).map_err(BuildError::Fanout)?;
        info!("Copied build files to distribution folders.");
        report.record(Stage::Fanout, StageOutcome::Done);

        let patcher = PlatformPatcher::new(&self.rules);
        for target in paths.patch_targets() {
            info!("Applying {}-specific patches...", target.name);
            let summary = patcher.patch(target.output_root());
            info!(
                patched = summary.patched,
                failed = summary.failed,
                "{} patching complete.",
                target.name
            );
            report.patches.push(TargetPatch { target: target.name.clone(), summary });
        }
        report.record(Stage::Patch, StageOutcome::Done);

        Ok(())
    }
}
