//! Remote-control line protocol.
//!
//! Each text frame is one request: a command word, optionally followed by a
//! single space and an argument. Mutations produce no reply. Queries produce
//! exactly one reply frame. Frames naming a command we do not know are
//! dropped without a reply so newer peers keep working against older timers.

use crate::control::TimerControl;
use crate::event::Command;
use crate::time::{TimeParseError, TimeSpan, TimerPhase};
use thiserror::Error;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCommand {
    Control(Command),
    CurrentTime,
    CurrentTimerPhase,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("unknown command `{0}`")]
    Unknown(String),

    #[error("`{command}` needs an argument")]
    MissingArgument { command: &'static str },

    #[error("`{command}` argument is not a time: {source}")]
    BadTime {
        command: &'static str,
        #[source]
        source: TimeParseError,
    },

    #[error("setvariable expects a JSON [name, value] array: {0}")]
    MalformedVariable(String),
}

impl RemoteCommand {
    pub fn parse(frame: &str) -> Result<Self, FrameError> {
        let frame = frame.trim_end_matches(['\r', '\n']);
        let (word, argument) = match frame.split_once(' ') {
            Some((word, argument)) => (word, Some(argument)),
            None => (frame, None),
        };

        let command = match word {
            "start" | "starttimer" => Command::Start,
            "split" => Command::Split,
            "splitorstart" => Command::SplitOrStart,
            "reset" => Command::Reset { save_attempt: None },
            // Peers send pause and resume as toggles
            "togglepause" | "pause" | "resume" => Command::TogglePauseOrStart,
            "undo" | "unsplit" => Command::UndoSplit,
            "skip" | "skipsplit" => Command::SkipSplit,
            "initgametime" => Command::InitializeGameTime,
            "setgametime" => Command::SetGameTime {
                time: time_argument("setgametime", argument)?,
            },
            "setloadingtimes" => Command::SetLoadingTimes {
                time: time_argument("setloadingtimes", argument)?,
            },
            "pausegametime" => Command::PauseGameTime,
            "resumegametime" => Command::ResumeGameTime,
            "setvariable" => {
                let argument = argument.ok_or(FrameError::MissingArgument {
                    command: "setvariable",
                })?;
                let (key, value): (String, String) = serde_json::from_str(argument)
                    .map_err(|e| FrameError::MalformedVariable(e.to_string()))?;
                Command::SetCustomVariable { key, value }
            }
            "getcurrenttime" => return Ok(RemoteCommand::CurrentTime),
            "getcurrenttimerphase" => return Ok(RemoteCommand::CurrentTimerPhase),
            other => return Err(FrameError::Unknown(other.to_string())),
        };
        Ok(RemoteCommand::Control(command))
    }
}

fn time_argument(command: &'static str, argument: Option<&str>) -> Result<TimeSpan, FrameError> {
    let argument = argument.ok_or(FrameError::MissingArgument { command })?;
    TimeSpan::parse(argument).map_err(|source| FrameError::BadTime { command, source })
}

/// Run one parsed request. Returns the reply frame for queries.
pub async fn dispatch<C: TimerControl>(control: &mut C, command: RemoteCommand) -> Option<String> {
    match command {
        RemoteCommand::Control(command) => {
            let name = command.name();
            let output = control.control(command).await;
            debug!(command = name, ?output, "remote command handled");
            None
        }
        RemoteCommand::CurrentTime => {
            let time = control.current_time();
            let span = time
                .get(control.current_timing_method())
                .or(time.real_time)
                .unwrap_or_default();
            Some(format_time_for_server(span))
        }
        RemoteCommand::CurrentTimerPhase => Some(phase_name(control.current_phase()).to_string()),
    }
}

/// Parse and run one frame. Frames that cannot be understood are logged and
/// dropped; the peer never gets an error frame.
pub async fn handle_frame<C: TimerControl>(control: &mut C, frame: &str) -> Option<String> {
    match RemoteCommand::parse(frame) {
        Ok(command) => dispatch(control, command).await,
        Err(error) => {
            ignore_frame(frame, &error);
            None
        }
    }
}

/// Log a frame that will get no reply.
pub fn ignore_frame(frame: &str, error: &FrameError) {
    match error {
        FrameError::Unknown(word) => trace!(%word, "ignoring unknown remote command"),
        error => warn!(%error, frame, "ignoring malformed remote command"),
    }
}

/// `HH:MM:SS.ss` when there are hours, `MM:SS.ss` otherwise, rounded to
/// hundredths.
pub fn format_time_for_server(time: TimeSpan) -> String {
    let nanos = time.total_nanos();
    let sign = if nanos < 0 { "-" } else { "" };
    let hundredths = (nanos.unsigned_abs() + 5_000_000) / 10_000_000;
    let hours = hundredths / 360_000;
    let minutes = hundredths / 6_000 % 60;
    let seconds = hundredths / 100 % 60;
    let fraction = hundredths % 100;
    if hours > 0 {
        format!("{sign}{hours:02}:{minutes:02}:{seconds:02}.{fraction:02}")
    } else {
        format!("{sign}{minutes:02}:{seconds:02}.{fraction:02}")
    }
}

pub fn phase_name(phase: TimerPhase) -> &'static str {
    phase.as_str()
}
