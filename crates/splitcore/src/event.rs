//! The closed command vocabulary and its outcomes.
//!
//! Every mutation is named by a [`Command`] and yields exactly one
//! [`CommandResult`]: an [`Event`] describing what changed, or a
//! [`CommandError`] describing why nothing did.

use crate::time::{TimeSpan, TimingMethod};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a successful command changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    Started,
    Splitted,
    Finished,
    Reset,
    SplitUndone,
    SplitSkipped,
    Paused,
    Resumed,
    PausesUndone,
    PausesUndoneAndResumed,
    ComparisonChanged,
    TimingMethodChanged,
    GameTimeInitialized,
    GameTimeSet,
    GameTimePaused,
    GameTimeResumed,
    LoadingTimesSet,
    CustomVariableSet,
    RunReplaced,
}

/// Why a command did not change anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum CommandError {
    #[error("interaction is locked")]
    Busy,
    #[error("the runner decided against resetting")]
    RunnerDecidedAgainstReset,
    #[error("could not parse the time")]
    CouldNotParseTime,
    #[error("no run is in progress")]
    NoRunInProgress,
    #[error("a run is already in progress")]
    RunAlreadyInProgress,
    #[error("the timer is paused")]
    TimerPaused,
    #[error("the timer is not paused")]
    NotPaused,
    #[error("the timer is already paused")]
    AlreadyPaused,
    #[error("the run is already finished")]
    RunFinished,
    #[error("the last split can't be skipped")]
    CantSkipLastSplit,
    #[error("the first split can't be undone")]
    CantUndoFirstSplit,
    #[error("the comparison doesn't exist")]
    ComparisonDoesntExist,
    #[error("the time must not be negative")]
    NegativeTime,
    #[error("game time is already initialized")]
    GameTimeAlreadyInitialized,
    #[error("game time is already paused")]
    GameTimeAlreadyPaused,
    #[error("game time is not paused")]
    GameTimeNotPaused,
    #[error("the run has no segments")]
    EmptyRun,
}

impl CommandError {
    /// Only [`CommandError::Busy`] may succeed if the same command is sent again
    /// later. A declined reset is a decision, not contention.
    pub fn is_retryable(self) -> bool {
        matches!(self, CommandError::Busy)
    }
}

pub type CommandResult = Result<Event, CommandError>;

/// A named mutation request.
///
/// Serialized as `{"command": "setGameTime", "time": 83.45}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Command {
    Start,
    Split,
    SplitOrStart,
    Reset {
        /// `None` asks the runner when the attempt holds new best times.
        #[serde(rename = "saveAttempt", default, skip_serializing_if = "Option::is_none")]
        save_attempt: Option<bool>,
    },
    UndoSplit,
    SkipSplit,
    TogglePauseOrStart,
    Pause,
    Resume,
    UndoAllPauses,
    SwitchToPreviousComparison,
    SwitchToNextComparison,
    SetCurrentComparison {
        comparison: String,
    },
    ToggleTimingMethod,
    SetCurrentTimingMethod {
        #[serde(rename = "timingMethod")]
        timing_method: TimingMethod,
    },
    InitializeGameTime,
    SetGameTime {
        time: TimeSpan,
    },
    PauseGameTime,
    ResumeGameTime,
    SetLoadingTimes {
        time: TimeSpan,
    },
    SetCustomVariable {
        key: String,
        value: String,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Split => "split",
            Command::SplitOrStart => "splitOrStart",
            Command::Reset { .. } => "reset",
            Command::UndoSplit => "undoSplit",
            Command::SkipSplit => "skipSplit",
            Command::TogglePauseOrStart => "togglePauseOrStart",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::UndoAllPauses => "undoAllPauses",
            Command::SwitchToPreviousComparison => "switchToPreviousComparison",
            Command::SwitchToNextComparison => "switchToNextComparison",
            Command::SetCurrentComparison { .. } => "setCurrentComparison",
            Command::ToggleTimingMethod => "toggleTimingMethod",
            Command::SetCurrentTimingMethod { .. } => "setCurrentTimingMethod",
            Command::InitializeGameTime => "initializeGameTime",
            Command::SetGameTime { .. } => "setGameTime",
            Command::PauseGameTime => "pauseGameTime",
            Command::ResumeGameTime => "resumeGameTime",
            Command::SetLoadingTimes { .. } => "setLoadingTimes",
            Command::SetCustomVariable { .. } => "setCustomVariable",
        }
    }
}
