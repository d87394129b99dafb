//! The task that owns the timer's command sink.
//!
//! HTTP handlers and WebSocket peers never touch the sink directly. They send
//! a [`Request`] through a [`TimerHandle`] and await the reply, so commands
//! run one at a time in arrival order. A reset runs in place unless it has to
//! ask the runner. Then the interaction gate is locked before the loop moves
//! on, only the prompt moves onto its own task, and everything queued behind
//! it answers `Busy` instead of waiting.

use anyhow::{anyhow, Result};
use splitcore::remote::{dispatch, ignore_frame};
use splitcore::{Command, CommandResult, CommandSink, RemoteCommand, ResetStep, TimerSnapshot};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

enum Request {
    Execute {
        command: Command,
        reply: oneshot::Sender<CommandResult>,
    },
    Frame {
        frame: String,
        reply: oneshot::Sender<Option<String>>,
    },
    Snapshot {
        reply: oneshot::Sender<TimerSnapshot>,
    },
}

/// Cheap cloneable sender side of the service.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    tx: mpsc::Sender<Request>,
}

impl TimerHandle {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Request) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| anyhow!("timer service stopped"))?;
        rx.await.map_err(|_| anyhow!("timer service dropped the request"))
    }

    pub async fn execute(&self, command: Command) -> Result<CommandResult> {
        self.request(|reply| Request::Execute { command, reply })
            .await
    }

    /// Run one remote-control frame and return its reply frame, if any.
    pub async fn frame(&self, frame: impl Into<String>) -> Result<Option<String>> {
        let frame = frame.into();
        self.request(|reply| Request::Frame { frame, reply }).await
    }

    pub async fn snapshot(&self) -> Result<TimerSnapshot> {
        self.request(|reply| Request::Snapshot { reply }).await
    }
}

pub struct TimerService {
    sink: CommandSink,
    rx: mpsc::Receiver<Request>,
}

impl TimerService {
    pub fn new(sink: CommandSink, buffer_size: usize) -> (Self, TimerHandle) {
        let (tx, rx) = mpsc::channel(buffer_size);
        (Self { sink, rx }, TimerHandle { tx })
    }

    /// Spawn onto the current runtime and hand back the handle.
    pub fn spawn(sink: CommandSink, buffer_size: usize) -> TimerHandle {
        let (service, handle) = Self::new(sink, buffer_size);
        tokio::spawn(service.run());
        handle
    }

    /// Serve requests until every handle is dropped.
    pub async fn run(mut self) {
        info!("timer service running");
        while let Some(request) = self.rx.recv().await {
            self.handle(request).await;
        }
        info!("timer service stopped");
    }

    async fn handle(&mut self, request: Request) {
        match request {
            Request::Execute {
                command: Command::Reset { save_attempt },
                reply,
            } => self.reset(save_attempt, move |result| {
                let _ = reply.send(result);
            }),
            Request::Execute { command, reply } => {
                let _ = reply.send(self.sink.execute(command).await);
            }
            Request::Frame { frame, reply } => {
                let response = match RemoteCommand::parse(&frame) {
                    Ok(RemoteCommand::Control(Command::Reset { save_attempt })) => {
                        self.reset(save_attempt, |result| {
                            debug!(command = "reset", ?result, "remote command handled");
                        });
                        None
                    }
                    Ok(command) => dispatch(&mut self.sink, command).await,
                    Err(error) => {
                        ignore_frame(&frame, &error);
                        None
                    }
                };
                let _ = reply.send(response);
            }
            Request::Snapshot { reply } => {
                let _ = reply.send(self.sink.snapshot());
            }
        }
    }

    /// Reset in place, or lock and hand the prompt to its own task.
    fn reset(&self, save_attempt: Option<bool>, done: impl FnOnce(CommandResult) + Send + 'static) {
        match self.sink.begin_reset(save_attempt) {
            ResetStep::Done(result) => done(result),
            ResetStep::Prompt(pending) => {
                debug!("reset prompt running on its own task");
                tokio::spawn(async move { done(pending.finish().await) });
            }
        }
    }
}
