use crate::command_sink::CommandSink;
use crate::event::{Command, CommandResult};
use crate::event_sink::EventSink;
use crate::time::{Time, TimerPhase, TimingMethod};
use async_trait::async_trait;
use std::fmt::Debug;

/// Anything the remote protocol can drive: a [`CommandSink`] in shared mode or
/// an [`EventSink`] in direct mode.
#[async_trait]
pub trait TimerControl: Send {
    type Output: Debug + Send;

    async fn control(&mut self, command: Command) -> Self::Output;

    fn current_phase(&self) -> TimerPhase;

    fn current_time(&self) -> Time;

    fn current_timing_method(&self) -> TimingMethod;
}

#[async_trait]
impl TimerControl for CommandSink {
    type Output = CommandResult;

    async fn control(&mut self, command: Command) -> CommandResult {
        self.execute(command).await
    }

    fn current_phase(&self) -> TimerPhase {
        CommandSink::current_phase(self)
    }

    fn current_time(&self) -> Time {
        CommandSink::current_time(self)
    }

    fn current_timing_method(&self) -> TimingMethod {
        CommandSink::current_timing_method(self)
    }
}

#[async_trait]
impl TimerControl for EventSink {
    type Output = ();

    async fn control(&mut self, command: Command) {
        self.execute(command).await;
    }

    fn current_phase(&self) -> TimerPhase {
        EventSink::current_phase(self)
    }

    fn current_time(&self) -> Time {
        EventSink::current_time(self)
    }

    fn current_timing_method(&self) -> TimingMethod {
        EventSink::current_timing_method(self)
    }
}
