use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{info, warn};

/// Stage a pipeline run has just entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    Normalizing,
    Cleaning,
    Enriching,
    Persisting,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetching => "fetching",
            Stage::Normalizing => "normalizing",
            Stage::Cleaning => "cleaning",
            Stage::Enriching => "enriching",
            Stage::Persisting => "persisting",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Progress notification sent on every stage transition.
#[derive(Debug, Clone, PartialEq)]
pub struct StageEvent {
    pub stage: Stage,
    /// Fraction of the run completed, in `[0, 1]`.
    pub fraction: f32,
    pub label: String,
}

impl StageEvent {
    pub fn new(stage: Stage, fraction: f32, label: impl Into<String>) -> Self {
        Self {
            stage,
            fraction: fraction.clamp(0.0, 1.0),
            label: label.into(),
        }
    }
}

/// Receives stage transitions. Purely advisory; it cannot alter a run.
pub trait ProgressObserver {
    fn on_stage(&self, event: &StageEvent);
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_stage(&self, _event: &StageEvent) {}
}

/// Observer that logs each event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_stage(&self, event: &StageEvent) {
        info!(
            stage = %event.stage,
            progress = event.fraction,
            "{}",
            event.label
        );
    }
}

impl<F: Fn(&StageEvent)> ProgressObserver for F {
    fn on_stage(&self, event: &StageEvent) {
        self(event)
    }
}

/// Delivers `event`, swallowing a panic raised by the observer.
pub(crate) fn notify(observer: &dyn ProgressObserver, event: StageEvent) {
    if catch_unwind(AssertUnwindSafe(|| observer.on_stage(&event))).is_err() {
        warn!(stage = %event.stage, "progress observer panicked; ignoring");
    }
}
