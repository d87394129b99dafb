//! The mutation gateway for a timer shared between components.
//!
//! Every operation checks the interaction gate first and answers `Busy`
//! without touching the engine while it is locked. Otherwise it takes the
//! write guard for exactly one engine call, releases it, and then notifies the
//! observer. `reset` is the one operation that may suspend: when the attempt
//! holds new best times it asks the runner first, with interaction locked for
//! as long as the prompt is open. The lock is taken in the same step that
//! checks the gate, so two resets never both reach a prompt.

use crate::dialog::{confirm_reset, Dialog};
use crate::engine::TimerSnapshot;
use crate::event::{Command, CommandError, CommandResult, Event};
use crate::interaction::{InteractionGate, InteractionLock};
use crate::observer::CommandObserver;
use crate::run::Run;
use crate::shared::SharedTimer;
use crate::time::{Time, TimeSpan, TimerPhase, TimingMethod};
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct CommandSink {
    timer: SharedTimer,
    gate: InteractionGate,
    observer: Arc<dyn CommandObserver>,
    dialog: Arc<dyn Dialog>,
}

/// A run swapped in by [`CommandSink::set_run`].
#[derive(Debug)]
pub struct RunReplaced {
    pub event: Event,
    pub previous: Run,
}

/// A run [`CommandSink::set_run`] did not take, handed back to the caller.
#[derive(Debug)]
pub struct RunRejected {
    pub error: CommandError,
    pub run: Run,
}

/// Outcome of [`CommandSink::begin_reset`].
#[derive(Debug)]
pub enum ResetStep {
    Done(CommandResult),
    Prompt(PendingReset),
}

/// A reset waiting on the runner. Interaction stays locked until it is
/// finished or dropped.
#[derive(Debug)]
#[must_use = "dropping a pending reset cancels it"]
pub struct PendingReset {
    sink: CommandSink,
    lock: InteractionLock,
}

impl PendingReset {
    /// Ask the runner, then reset with their answer. Refuses with `Busy` if
    /// someone else locked interaction while the prompt was open.
    pub async fn finish(self) -> CommandResult {
        let Self { sink, lock } = self;
        let decision = confirm_reset(sink.dialog.as_ref()).await;
        debug!(?decision, "runner answered reset prompt");
        let Some(save_attempt) = decision.save_attempt() else {
            return Err(CommandError::RunnerDecidedAgainstReset);
        };
        sink.run_holding(
            lock,
            Command::Reset {
                save_attempt: Some(save_attempt),
            },
        )
    }
}

impl CommandSink {
    pub fn new(
        timer: SharedTimer,
        observer: Arc<dyn CommandObserver>,
        dialog: Arc<dyn Dialog>,
    ) -> Self {
        Self {
            timer,
            gate: InteractionGate::new(),
            observer,
            dialog,
        }
    }

    /// Share an existing gate, e.g. one an editor view already locks.
    pub fn with_gate(mut self, gate: InteractionGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn shared_timer(&self) -> &SharedTimer {
        &self.timer
    }

    pub fn interaction(&self) -> &InteractionGate {
        &self.gate
    }

    pub fn is_locked(&self) -> bool {
        self.gate.is_locked()
    }

    fn run(&self, command: Command) -> CommandResult {
        if self.gate.is_locked() {
            debug!(command = command.name(), "interaction locked, command refused");
            return Err(CommandError::Busy);
        }
        self.apply(command)
    }

    /// Run while holding `lock`. Any lock besides this one still refuses.
    fn run_holding(&self, lock: InteractionLock, command: Command) -> CommandResult {
        if self.gate.lock_count() > 1 {
            debug!(command = command.name(), "interaction locked, command refused");
            return Err(CommandError::Busy);
        }
        let result = self.apply(command);
        lock.unlock();
        result
    }

    fn apply(&self, command: Command) -> CommandResult {
        let result = self.timer.write_with(|timer| timer.execute(&command));
        debug!(command = command.name(), ?result, "command executed");
        if let Ok(event) = result {
            self.observer.handle_event(event);
        }
        result
    }

    /// Dispatch any command by value. Awaits only for a reset that has to ask.
    pub async fn execute(&self, command: Command) -> CommandResult {
        match command {
            Command::Reset { save_attempt } => self.reset_with(save_attempt).await,
            Command::SetCustomVariable { key, value } => self.set_custom_variable(&key, &value),
            other => self.run(other),
        }
    }

    pub fn start(&self) -> CommandResult {
        self.run(Command::Start)
    }

    pub fn split(&self) -> CommandResult {
        self.run(Command::Split)
    }

    pub fn split_or_start(&self) -> CommandResult {
        self.run(Command::SplitOrStart)
    }

    pub async fn reset(&self) -> CommandResult {
        self.reset_with(None).await
    }

    /// Reset with an explicit decision, or `None` to ask the runner when the
    /// attempt holds new best times.
    #[instrument(skip(self))]
    pub async fn reset_with(&self, save_attempt: Option<bool>) -> CommandResult {
        match self.begin_reset(save_attempt) {
            ResetStep::Done(result) => result,
            ResetStep::Prompt(pending) => pending.finish().await,
        }
    }

    /// The synchronous half of a reset. Either the reset is already decided
    /// and done, or a prompt is needed and the returned [`PendingReset`]
    /// already holds the interaction lock.
    pub fn begin_reset(&self, save_attempt: Option<bool>) -> ResetStep {
        let lock = match self.gate.try_lock_interaction() {
            Some(lock) => lock,
            None => {
                debug!("interaction locked, reset refused");
                return ResetStep::Done(Err(CommandError::Busy));
            }
        };
        let save_attempt = match save_attempt {
            Some(save) => save,
            None if self.current_attempt_has_new_best_times() => {
                return ResetStep::Prompt(PendingReset {
                    sink: self.clone(),
                    lock,
                });
            }
            None => true,
        };
        ResetStep::Done(self.run_holding(
            lock,
            Command::Reset {
                save_attempt: Some(save_attempt),
            },
        ))
    }

    pub fn undo_split(&self) -> CommandResult {
        self.run(Command::UndoSplit)
    }

    pub fn skip_split(&self) -> CommandResult {
        self.run(Command::SkipSplit)
    }

    pub fn toggle_pause_or_start(&self) -> CommandResult {
        self.run(Command::TogglePauseOrStart)
    }

    pub fn pause(&self) -> CommandResult {
        self.run(Command::Pause)
    }

    pub fn resume(&self) -> CommandResult {
        self.run(Command::Resume)
    }

    pub fn undo_all_pauses(&self) -> CommandResult {
        self.run(Command::UndoAllPauses)
    }

    pub fn switch_to_previous_comparison(&self) -> CommandResult {
        self.run(Command::SwitchToPreviousComparison)
    }

    pub fn switch_to_next_comparison(&self) -> CommandResult {
        self.run(Command::SwitchToNextComparison)
    }

    pub fn set_current_comparison(&self, comparison: &str) -> CommandResult {
        self.run(Command::SetCurrentComparison {
            comparison: comparison.to_string(),
        })
    }

    pub fn toggle_timing_method(&self) -> CommandResult {
        self.run(Command::ToggleTimingMethod)
    }

    pub fn set_current_timing_method(&self, timing_method: TimingMethod) -> CommandResult {
        self.run(Command::SetCurrentTimingMethod { timing_method })
    }

    pub fn initialize_game_time(&self) -> CommandResult {
        self.run(Command::InitializeGameTime)
    }

    pub fn set_game_time(&self, time: TimeSpan) -> CommandResult {
        self.run(Command::SetGameTime { time })
    }

    /// Parse and set the game time. A locked gate answers `Busy` before the
    /// text is parsed.
    pub fn set_game_time_str(&self, time: &str) -> CommandResult {
        if self.gate.is_locked() {
            return Err(CommandError::Busy);
        }
        let time = TimeSpan::parse(time).map_err(|_| CommandError::CouldNotParseTime)?;
        self.set_game_time(time)
    }

    pub fn pause_game_time(&self) -> CommandResult {
        self.run(Command::PauseGameTime)
    }

    pub fn resume_game_time(&self) -> CommandResult {
        self.run(Command::ResumeGameTime)
    }

    pub fn set_loading_times(&self, time: TimeSpan) -> CommandResult {
        self.run(Command::SetLoadingTimes { time })
    }

    /// Same precedence as [`CommandSink::set_game_time_str`].
    pub fn set_loading_times_str(&self, time: &str) -> CommandResult {
        if self.gate.is_locked() {
            return Err(CommandError::Busy);
        }
        let time = TimeSpan::parse(time).map_err(|_| CommandError::CouldNotParseTime)?;
        self.set_loading_times(time)
    }

    pub fn set_custom_variable(&self, key: &str, value: &str) -> CommandResult {
        let event = self.run(Command::SetCustomVariable {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        self.observer.encountered_custom_variable(key);
        Ok(event)
    }

    /// Replace the timer's run. The previous run comes back on success, the
    /// offered run on failure.
    pub fn set_run(&self, run: Run) -> Result<RunReplaced, RunRejected> {
        if self.gate.is_locked() {
            return Err(RunRejected {
                error: CommandError::Busy,
                run,
            });
        }
        match self.timer.write_with(|timer| timer.set_run(run)) {
            Ok(previous) => {
                debug!("run replaced");
                self.observer.handle_event(Event::RunReplaced);
                self.observer.run_changed();
                Ok(RunReplaced {
                    event: Event::RunReplaced,
                    previous,
                })
            }
            Err(run) => Err(RunRejected {
                error: CommandError::EmptyRun,
                run,
            }),
        }
    }

    pub fn mark_as_unmodified(&self) {
        self.timer.write_with(|timer| timer.mark_as_unmodified());
        self.observer.run_not_modified_anymore();
    }

    pub fn has_been_modified(&self) -> bool {
        self.timer.read_with(|timer| timer.has_been_modified())
    }

    pub fn current_attempt_has_new_best_times(&self) -> bool {
        self.timer
            .read_with(|timer| timer.current_attempt_has_new_best_times())
    }

    pub fn current_phase(&self) -> TimerPhase {
        self.timer.read_with(|timer| timer.current_phase())
    }

    pub fn current_time(&self) -> Time {
        self.timer.read_with(|timer| timer.current_time())
    }

    pub fn current_split_index(&self) -> Option<usize> {
        self.timer.read_with(|timer| timer.current_split_index())
    }

    pub fn segment_count(&self) -> usize {
        self.timer.read_with(|timer| timer.segment_count())
    }

    pub fn current_comparison(&self) -> String {
        self.timer.read_with(|timer| timer.current_comparison())
    }

    pub fn all_comparisons(&self) -> Vec<String> {
        self.timer.read_with(|timer| timer.comparisons())
    }

    pub fn all_custom_variables(&self) -> Vec<String> {
        self.timer.read_with(|timer| timer.custom_variable_names())
    }

    pub fn current_timing_method(&self) -> TimingMethod {
        self.timer.read_with(|timer| timer.current_timing_method())
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.timer.read_with(|timer| timer.snapshot())
    }
}

impl std::fmt::Debug for CommandSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSink")
            .field("timer", &self.timer)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}
