//! splitd - the splitshell timer daemon.
//!
//! One [`service::TimerService`] task owns the shared timer's command sink.
//! Remote-control peers, HTTP collaborators and `/events` subscribers all go
//! through it, so commands from every source run in arrival order.

pub mod dialogs;
pub mod notice;
pub mod serve;
pub mod service;
pub mod telemetry;
pub mod web;

pub use dialogs::{AnswerError, PendingDialog, PendingDialogs};
pub use notice::{Notice, NoticeBus, NoticeKind};
pub use serve::build_state;
pub use service::{TimerHandle, TimerService};
pub use web::{router, AppState};
