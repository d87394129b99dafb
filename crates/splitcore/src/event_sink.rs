//! Direct-mode counterpart of [`crate::CommandSink`].
//!
//! The sink owns its timer outright, so there is no contention to guard
//! against and no busy state. Instead of returning results it tells the
//! owning view which aspects changed, and only when the engine accepted the
//! command.

use crate::dialog::{confirm_reset, Dialog};
use crate::engine::TimerSnapshot;
use crate::event::Command;
use crate::observer::TimerObserver;
use crate::run::Run;
use crate::time::{Time, TimeSpan, TimerPhase, TimingMethod};
use crate::timer::Timer;
use std::sync::Arc;
use tracing::debug;

pub struct EventSink {
    timer: Timer,
    observer: Arc<dyn TimerObserver>,
    dialog: Arc<dyn Dialog>,
}

impl EventSink {
    pub fn new(timer: Timer, observer: Arc<dyn TimerObserver>, dialog: Arc<dyn Dialog>) -> Self {
        Self {
            timer,
            observer,
            dialog,
        }
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Give the timer back, e.g. to share it behind a [`crate::CommandSink`].
    pub fn into_timer(self) -> Timer {
        self.timer
    }

    fn run(&mut self, command: Command) {
        let result = self.timer.execute(&command);
        debug!(command = command.name(), ?result, "command executed");
        if result.is_ok() {
            self.notify(&command);
        }
    }

    fn notify(&self, command: &Command) {
        let observer = self.observer.as_ref();
        match command {
            Command::Start | Command::SplitOrStart | Command::TogglePauseOrStart => {
                observer.current_phase_changed();
                observer.current_split_changed();
                observer.splits_modified_changed();
            }
            Command::Split | Command::UndoSplit => {
                observer.current_phase_changed();
                observer.current_split_changed();
            }
            Command::SkipSplit => observer.current_split_changed(),
            Command::Reset { .. } => {
                observer.current_phase_changed();
                observer.current_split_changed();
                observer.on_reset();
            }
            Command::Pause | Command::Resume | Command::UndoAllPauses => {
                observer.current_phase_changed();
            }
            Command::SwitchToPreviousComparison
            | Command::SwitchToNextComparison
            | Command::SetCurrentComparison { .. } => observer.current_comparison_changed(),
            Command::ToggleTimingMethod | Command::SetCurrentTimingMethod { .. } => {
                observer.current_timing_method_changed();
            }
            Command::InitializeGameTime
            | Command::SetGameTime { .. }
            | Command::PauseGameTime
            | Command::ResumeGameTime
            | Command::SetLoadingTimes { .. }
            | Command::SetCustomVariable { .. } => {}
        }
    }

    pub async fn execute(&mut self, command: Command) {
        match command {
            Command::Reset { save_attempt } => self.reset_with(save_attempt).await,
            other => self.run(other),
        }
    }

    pub fn start(&mut self) {
        self.run(Command::Start);
    }

    pub fn split(&mut self) {
        self.run(Command::Split);
    }

    pub fn split_or_start(&mut self) {
        self.run(Command::SplitOrStart);
    }

    pub async fn reset(&mut self) {
        self.reset_with(None).await;
    }

    pub async fn reset_with(&mut self, save_attempt: Option<bool>) {
        let save_attempt = match save_attempt {
            Some(save) => save,
            None if self.timer.current_attempt_has_new_best_times() => {
                let decision = confirm_reset(self.dialog.as_ref()).await;
                match decision.save_attempt() {
                    Some(save) => save,
                    None => {
                        debug!("runner decided against reset");
                        return;
                    }
                }
            }
            None => true,
        };
        self.run(Command::Reset {
            save_attempt: Some(save_attempt),
        });
    }

    pub fn undo_split(&mut self) {
        self.run(Command::UndoSplit);
    }

    pub fn skip_split(&mut self) {
        self.run(Command::SkipSplit);
    }

    pub fn toggle_pause_or_start(&mut self) {
        self.run(Command::TogglePauseOrStart);
    }

    pub fn pause(&mut self) {
        self.run(Command::Pause);
    }

    pub fn resume(&mut self) {
        self.run(Command::Resume);
    }

    pub fn undo_all_pauses(&mut self) {
        self.run(Command::UndoAllPauses);
    }

    pub fn switch_to_previous_comparison(&mut self) {
        self.run(Command::SwitchToPreviousComparison);
    }

    pub fn switch_to_next_comparison(&mut self) {
        self.run(Command::SwitchToNextComparison);
    }

    pub fn set_current_comparison(&mut self, comparison: &str) {
        self.run(Command::SetCurrentComparison {
            comparison: comparison.to_string(),
        });
    }

    pub fn toggle_timing_method(&mut self) {
        self.run(Command::ToggleTimingMethod);
    }

    pub fn set_current_timing_method(&mut self, timing_method: TimingMethod) {
        self.run(Command::SetCurrentTimingMethod { timing_method });
    }

    pub fn initialize_game_time(&mut self) {
        self.run(Command::InitializeGameTime);
    }

    pub fn set_game_time(&mut self, time: TimeSpan) {
        self.run(Command::SetGameTime { time });
    }

    /// Unparsable input is dropped.
    pub fn set_game_time_str(&mut self, time: &str) {
        match TimeSpan::parse(time) {
            Ok(time) => self.set_game_time(time),
            Err(error) => debug!(%error, "ignoring unparsable game time"),
        }
    }

    pub fn pause_game_time(&mut self) {
        self.run(Command::PauseGameTime);
    }

    pub fn resume_game_time(&mut self) {
        self.run(Command::ResumeGameTime);
    }

    pub fn set_loading_times(&mut self, time: TimeSpan) {
        self.run(Command::SetLoadingTimes { time });
    }

    pub fn set_loading_times_str(&mut self, time: &str) {
        match TimeSpan::parse(time) {
            Ok(time) => self.set_loading_times(time),
            Err(error) => debug!(%error, "ignoring unparsable loading times"),
        }
    }

    pub fn set_custom_variable(&mut self, key: &str, value: &str) {
        self.run(Command::SetCustomVariable {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    pub fn set_run(&mut self, run: Run) -> Result<Run, Run> {
        let previous = self.timer.set_run(run)?;
        let observer = self.observer.as_ref();
        observer.current_comparison_changed();
        observer.current_phase_changed();
        observer.current_split_changed();
        observer.comparison_list_changed();
        observer.splits_modified_changed();
        Ok(previous)
    }

    pub fn mark_as_unmodified(&mut self) {
        self.timer.mark_as_unmodified();
        self.observer.splits_modified_changed();
    }

    pub fn has_been_modified(&self) -> bool {
        self.timer.has_been_modified()
    }

    pub fn current_phase(&self) -> TimerPhase {
        self.timer.current_phase()
    }

    pub fn current_time(&self) -> Time {
        self.timer.current_time()
    }

    pub fn current_split_index(&self) -> Option<usize> {
        self.timer.current_split_index()
    }

    pub fn segment_count(&self) -> usize {
        self.timer.segment_count()
    }

    pub fn current_comparison(&self) -> String {
        self.timer.current_comparison()
    }

    pub fn all_comparisons(&self) -> Vec<String> {
        self.timer.comparisons()
    }

    pub fn all_custom_variables(&self) -> Vec<String> {
        self.timer.custom_variable_names()
    }

    pub fn current_timing_method(&self) -> TimingMethod {
        self.timer.current_timing_method()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.timer.snapshot()
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("timer", &self.timer)
            .finish_non_exhaustive()
    }
}
