//! Notices pushed to `/events` subscribers.
//!
//! Every successful command, run swap and dialog becomes one [`Notice`] on a
//! broadcast channel. Slow subscribers lag and skip ahead; nobody blocks the
//! timer.

use chrono::{DateTime, Utc};
use serde::Serialize;
use splitcore::{CommandObserver, DialogRequest, Event};
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NoticeKind {
    Event { event: Event },
    RunChanged,
    RunNotModifiedAnymore,
    CustomVariable { name: String },
    DialogOpened { id: Uuid, request: DialogRequest },
    DialogClosed { id: Uuid, choice: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: NoticeKind,
}

/// Sender half of the notice channel. Cloning shares the channel.
#[derive(Debug, Clone)]
pub struct NoticeBus {
    tx: broadcast::Sender<Notice>,
}

impl NoticeBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub fn publish(&self, kind: NoticeKind) {
        let notice = Notice {
            at: Utc::now(),
            kind,
        };
        // No subscribers is fine
        if self.tx.send(notice).is_err() {
            trace!("notice dropped, no subscribers");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl CommandObserver for NoticeBus {
    fn handle_event(&self, event: Event) {
        self.publish(NoticeKind::Event { event });
    }

    fn run_changed(&self) {
        self.publish(NoticeKind::RunChanged);
    }

    fn run_not_modified_anymore(&self) {
        self.publish(NoticeKind::RunNotModifiedAnymore);
    }

    fn encountered_custom_variable(&self, name: &str) {
        self.publish(NoticeKind::CustomVariable {
            name: name.to_string(),
        });
    }
}
