use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info_span, warn};

/// Pipeline stages, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Diff,
    Dup,
    Classify,
    Decide,
    WriteScript,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Diff => "diff",
            Stage::Dup => "dup",
            Stage::Classify => "classify",
            Stage::Decide => "decide",
            Stage::WriteScript => "write script",
        };
        f.write_str(name)
    }
}

/// Trait for reporting pipeline progress.
///
/// CLI implements with indicatif spinners. All methods have default no-op
/// implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_stage_start(&self, _stage: Stage) {}
    fn on_stage_complete(&self, _stage: Stage, _duration: Duration) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// Runs each stage inside a tracing span, reports it and warns when it
/// takes longer than `slow_after`.
pub struct StageTimer<'a> {
    reporter: &'a dyn ProgressReporter,
    slow_after: Duration,
    timings: Vec<(Stage, Duration)>,
}

impl<'a> StageTimer<'a> {
    pub fn new(reporter: &'a dyn ProgressReporter, slow_after: Duration) -> Self {
        Self {
            reporter,
            slow_after,
            timings: Vec::new(),
        }
    }

    pub fn run<T>(&mut self, stage: Stage, f: impl FnOnce() -> T) -> T {
        let span = info_span!("stage", name = %stage);
        let _entered = span.enter();

        self.reporter.on_stage_start(stage);
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();
        self.reporter.on_stage_complete(stage, elapsed);

        if elapsed > self.slow_after {
            warn!("Stage {} took {:.4} seconds", stage, elapsed.as_secs_f64());
        } else {
            debug!("Stage {} took {:.4} seconds", stage, elapsed.as_secs_f64());
        }
        self.timings.push((stage, elapsed));
        result
    }

    pub fn into_timings(self) -> Vec<(Stage, Duration)> {
        self.timings
    }
}
