//! The engine boundary.
//!
//! The engine owns every run and timer. Callers only ever see raw numeric
//! handles and marshalled copies of state, the same way a compiled module
//! behind an FFI table would expose them. [`crate::Handle`] is the only type
//! that should hold a [`RawHandle`].

mod clock;
mod local;

pub use clock::{Clock, ManualClock, SystemClock};
pub use local::LocalEngine;

use crate::event::{Command, CommandResult};
use crate::time::{Time, TimeSpan, TimerPhase, TimingMethod};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// A slot in the engine's resource table. [`NULL_HANDLE`] is never allocated.
pub type RawHandle = u64;

pub const NULL_HANDLE: RawHandle = 0;

pub const PERSONAL_BEST_COMPARISON: &str = "Personal Best";
pub const BEST_SEGMENTS_COMPARISON: &str = "Best Segments";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("a timer needs a run with at least one segment")]
    EmptyRun,
}

/// Marshalled copy of one segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentInfo {
    pub name: String,
    pub personal_best_split_time: Time,
    pub best_segment_time: Time,
    /// Split time recorded in the current attempt.
    pub split_time: Time,
}

/// Marshalled copy of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunInfo {
    pub game_name: String,
    pub category_name: String,
    pub attempt_count: u32,
    pub segments: Vec<SegmentInfo>,
    pub custom_comparisons: Vec<String>,
    pub custom_variables: BTreeMap<String, String>,
    pub has_been_modified: bool,
}

/// Everything a renderer needs in one marshalled read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerSnapshot {
    pub phase: TimerPhase,
    pub current_time: Time,
    pub current_split_index: Option<usize>,
    pub current_comparison: String,
    pub comparisons: Vec<String>,
    pub current_timing_method: TimingMethod,
    pub is_game_time_initialized: bool,
    pub is_game_time_paused: bool,
    pub loading_times: TimeSpan,
    pub run: RunInfo,
}

/// The handle-based surface of a timer engine.
///
/// Every method that takes a handle panics when given one it never allocated
/// or already dropped. Callers keep handles alive through [`crate::Handle`].
pub trait Engine: Send + Sync + 'static {
    fn run_new(&self) -> RawHandle;
    fn run_clone(&self, run: RawHandle) -> RawHandle;
    fn run_drop(&self, run: RawHandle);
    fn run_push_segment(&self, run: RawHandle, name: &str);
    fn run_set_game_name(&self, run: RawHandle, name: &str);
    fn run_set_category_name(&self, run: RawHandle, name: &str);
    /// False when the name is already taken or reserved.
    fn run_add_custom_comparison(&self, run: RawHandle, name: &str) -> bool;
    fn run_info(&self, run: RawHandle) -> RunInfo;

    /// Consumes `run` and returns a timer, or [`NULL_HANDLE`] with `run`
    /// untouched when it has no segments.
    fn timer_new(&self, run: RawHandle) -> RawHandle;
    fn timer_drop(&self, timer: RawHandle);
    fn timer_execute(&self, timer: RawHandle, command: &Command) -> CommandResult;
    /// Consumes `run` and returns the previous run, or [`NULL_HANDLE`] with
    /// `run` untouched when it has no segments.
    fn timer_set_run(&self, timer: RawHandle, run: RawHandle) -> RawHandle;
    fn timer_snapshot(&self, timer: RawHandle) -> TimerSnapshot;
    fn timer_current_phase(&self, timer: RawHandle) -> TimerPhase;
    fn timer_current_time(&self, timer: RawHandle) -> Time;
    fn timer_current_attempt_has_new_best_times(&self, timer: RawHandle) -> bool;
    fn timer_mark_as_unmodified(&self, timer: RawHandle);

    /// Number of allocated runs and timers.
    fn live_handles(&self) -> usize;
}
