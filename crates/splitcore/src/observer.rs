//! Callbacks fired after successful mutations.

use crate::event::Event;

/// Notified by [`crate::CommandSink`].
pub trait CommandObserver: Send + Sync {
    fn handle_event(&self, event: Event);

    fn run_changed(&self) {}

    fn run_not_modified_anymore(&self) {}

    fn encountered_custom_variable(&self, _name: &str) {}
}

/// Notified by [`crate::EventSink`], one hook per aspect a view may re-render.
pub trait TimerObserver: Send + Sync {
    fn current_comparison_changed(&self) {}

    fn current_timing_method_changed(&self) {}

    fn current_phase_changed(&self) {}

    fn current_split_changed(&self) {}

    fn comparison_list_changed(&self) {}

    fn splits_modified_changed(&self) {}

    fn on_reset(&self) {}
}

/// Ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl CommandObserver for NoopObserver {
    fn handle_event(&self, _event: Event) {}
}

impl TimerObserver for NoopObserver {}
