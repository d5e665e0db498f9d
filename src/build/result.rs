//! Build result types.
//!
//! Contains types for representing the outcome of a pipeline run.

use crate::patch::PatchSummary;
use std::time::Duration;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Staging,
    Payload,
    Styles,
    Bundle,
    Fanout,
    Patch,
}

impl Stage {
    /// Every stage in execution order.
    pub const ALL: [Stage; 6] =
        [Stage::Staging, Stage::Payload, Stage::Styles, Stage::Bundle, Stage::Fanout, Stage::Patch];
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Staging => write!(f, "staging"),
            Stage::Payload => write!(f, "payload"),
            Stage::Styles => write!(f, "styles"),
            Stage::Bundle => write!(f, "bundle"),
            Stage::Fanout => write!(f, "fan-out"),
            Stage::Patch => write!(f, "patch"),
        }
    }
}

/// Outcome of a single stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// Stage completed
    Done,
    /// Stage failed but the failure was absorbed
    Recovered(String),
    /// Stage failed and aborted the build
    Failed(String),
    /// Stage never ran
    Skipped,
}

impl StageOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, StageOutcome::Failed(_))
    }
}

impl std::fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageOutcome::Done => write!(f, "done"),
            StageOutcome::Recovered(err) => write!(f, "recovered: {}", err),
            StageOutcome::Failed(err) => write!(f, "failed: {}", err),
            StageOutcome::Skipped => write!(f, "skipped"),
        }
    }
}

/// Patch pass result for one distribution target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPatch {
    /// Target name
    pub target: String,
    /// Per-file counts
    pub summary: PatchSummary,
}

/// Result of a complete pipeline run.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Recorded stage outcomes, in execution order
    stages: Vec<(Stage, StageOutcome)>,
    /// Patch results for each patched target
    pub patches: Vec<TargetPatch>,
    /// Fatal error message, if the build failed
    pub error: Option<String>,
    /// Total build duration
    pub total_duration: Duration,
}

impl BuildReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a stage.
    pub fn record(&mut self, stage: Stage, outcome: StageOutcome) {
        self.stages.push((stage, outcome));
    }

    /// Outcome of a stage; stages that never ran are `Skipped`.
    pub fn outcome(&self, stage: Stage) -> StageOutcome {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, o)| o.clone())
            .unwrap_or(StageOutcome::Skipped)
    }

    /// Mark the build failed.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    /// Check if the build succeeded (no fatal error).
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Number of stages whose failure was absorbed.
    pub fn recovered_count(&self) -> usize {
        self.stages.iter().filter(|(_, o)| matches!(o, StageOutcome::Recovered(_))).count()
    }

    /// Files rewritten across every patched target.
    pub fn files_patched(&self) -> usize {
        self.patches.iter().map(|p| p.summary.patched).sum()
    }

    /// Per-file patch failures across every patched target.
    pub fn patch_failures(&self) -> usize {
        self.patches.iter().map(|p| p.summary.failed).sum()
    }

    /// Generate a one-line summary.
    pub fn summary(&self) -> String {
        let duration = format_duration(self.total_duration);
        match &self.error {
            Some(err) => format!("Build failed in {}: {}", duration, err),
            None => {
                let mut line = format!(
                    "Build succeeded in {}: {} file{} patched",
                    duration,
                    self.files_patched(),
                    if self.files_patched() == 1 { "" } else { "s" }
                );
                let recovered = self.recovered_count() + self.patch_failures();
                if recovered > 0 {
                    line.push_str(&format!(", {} recovered error(s)", recovered));
                }
                line
            }
        }
    }
}

/// Format duration for display
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}
