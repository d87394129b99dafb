//! splitcore - handle ownership, shared timer access and command dispatch.
//!
//! The timer engine lives behind a handle-based boundary ([`engine::Engine`]).
//! Everything above it is about holding those handles safely:
//!
//! - [`Handle`], [`Run`] and [`Timer`] own engine resources and release them
//!   exactly once.
//! - [`SharedTimer`] lets many components read one timer and occasionally
//!   write it.
//! - [`CommandSink`] turns named operations into [`Event`]s or
//!   [`CommandError`]s, refusing work while an [`InteractionGate`] is locked
//!   and asking the runner through a [`Dialog`] before discarding best times.
//! - [`EventSink`] does the same for a view that owns its timer outright.
//! - [`remote`] speaks the text line protocol used by remote-control peers.

pub mod command_sink;
pub mod control;
pub mod dialog;
pub mod engine;
pub mod event;
pub mod event_sink;
pub mod handle;
pub mod interaction;
pub mod observer;
pub mod remote;
pub mod run;
pub mod shared;
pub mod time;
pub mod timer;

pub use command_sink::{CommandSink, PendingReset, ResetStep, RunRejected, RunReplaced};
pub use control::TimerControl;
pub use dialog::{confirm_reset, Dialog, DialogRequest, FixedChoice, ResetDecision};
pub use engine::{Engine, EngineError, LocalEngine, RunInfo, TimerSnapshot};
pub use event::{Command, CommandError, CommandResult, Event};
pub use event_sink::EventSink;
pub use handle::{Handle, Resource};
pub use interaction::{InteractionGate, InteractionLock};
pub use observer::{CommandObserver, NoopObserver, TimerObserver};
pub use remote::{FrameError, RemoteCommand};
pub use run::Run;
pub use shared::{SharedTimer, TimerReadGuard, TimerWriteGuard};
pub use time::{Time, TimeParseError, TimeSpan, TimerPhase, TimingMethod};
pub use timer::Timer;
