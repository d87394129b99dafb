use crate::engine::{Engine, EngineError, RawHandle, RunInfo, TimerSnapshot, NULL_HANDLE};
use crate::event::{Command, CommandResult};
use crate::handle::{Handle, Resource};
use crate::run::Run;
use crate::shared::SharedTimer;
use crate::time::{Time, TimerPhase, TimingMethod};
use std::sync::Arc;

pub struct TimerResource;

impl Resource for TimerResource {
    const KIND: &'static str = "timer";

    fn release(engine: &dyn Engine, raw: RawHandle) {
        engine.timer_drop(raw);
    }
}

/// An owned timer. `&Timer` reads, `&mut Timer` mutates.
#[derive(Debug)]
pub struct Timer {
    handle: Handle<TimerResource>,
}

impl Timer {
    /// Create a timer for `run`, which the timer takes over. A run without
    /// segments is rejected and released.
    pub fn new(run: Run) -> Result<Self, EngineError> {
        let engine = run.handle().engine().clone();
        let raw = engine.timer_new(run.handle().raw());
        if raw == NULL_HANDLE {
            return Err(EngineError::EmptyRun);
        }
        run.into_raw();
        Ok(Self::from_raw(engine, raw))
    }

    pub fn from_raw(engine: Arc<dyn Engine>, raw: RawHandle) -> Self {
        Self {
            handle: Handle::from_raw(engine, raw),
        }
    }

    pub fn handle(&self) -> &Handle<TimerResource> {
        &self.handle
    }

    /// Move the timer out, leaving a disposed one in its place.
    pub fn take(&mut self) -> Self {
        Self {
            handle: self.handle.take(),
        }
    }

    pub fn execute(&mut self, command: &Command) -> CommandResult {
        self.handle
            .engine()
            .timer_execute(self.handle.raw(), command)
    }

    /// Swap in a new run and get the previous one back. The run comes back
    /// as the error when the engine rejects it.
    pub fn set_run(&mut self, run: Run) -> Result<Run, Run> {
        let engine = self.handle.engine().clone();
        let previous = engine.timer_set_run(self.handle.raw(), run.handle().raw());
        if previous == NULL_HANDLE {
            return Err(run);
        }
        run.into_raw();
        Ok(Run::from_raw(engine, previous))
    }

    pub fn mark_as_unmodified(&mut self) {
        self.handle
            .engine()
            .timer_mark_as_unmodified(self.handle.raw());
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.handle.engine().timer_snapshot(self.handle.raw())
    }

    pub fn current_phase(&self) -> TimerPhase {
        self.handle.engine().timer_current_phase(self.handle.raw())
    }

    pub fn current_time(&self) -> Time {
        self.handle.engine().timer_current_time(self.handle.raw())
    }

    pub fn current_attempt_has_new_best_times(&self) -> bool {
        self.handle
            .engine()
            .timer_current_attempt_has_new_best_times(self.handle.raw())
    }

    pub fn current_split_index(&self) -> Option<usize> {
        self.snapshot().current_split_index
    }

    pub fn current_comparison(&self) -> String {
        self.snapshot().current_comparison
    }

    pub fn current_timing_method(&self) -> TimingMethod {
        self.snapshot().current_timing_method
    }

    pub fn comparisons(&self) -> Vec<String> {
        self.snapshot().comparisons
    }

    pub fn run_info(&self) -> RunInfo {
        self.snapshot().run
    }

    pub fn segment_count(&self) -> usize {
        self.run_info().segments.len()
    }

    pub fn has_been_modified(&self) -> bool {
        self.run_info().has_been_modified
    }

    pub fn custom_variable_names(&self) -> Vec<String> {
        self.run_info().custom_variables.into_keys().collect()
    }

    pub fn into_shared(self) -> SharedTimer {
        SharedTimer::new(self)
    }

    pub fn is_disposed(&self) -> bool {
        self.handle.is_disposed()
    }

    pub fn release(&mut self) {
        self.handle.release();
    }
}
