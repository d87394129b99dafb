//! Prompts parked until a collaborator answers them over HTTP.

use crate::notice::{NoticeBus, NoticeKind};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use splitcore::{Dialog, DialogRequest};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnswerError {
    #[error("no pending dialog {0}")]
    NotFound(Uuid),

    #[error("dialog has {buttons} buttons, got choice {choice}")]
    ChoiceOutOfRange { choice: usize, buttons: usize },
}

struct Pending {
    request: DialogRequest,
    answer: oneshot::Sender<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingDialog {
    pub id: Uuid,
    #[serde(flatten)]
    pub request: DialogRequest,
}

/// A [`Dialog`] that parks each request under a fresh id. Whoever calls
/// [`PendingDialogs::answer`] with that id resolves it.
pub struct PendingDialogs {
    pending: DashMap<Uuid, Pending>,
    notices: NoticeBus,
}

impl PendingDialogs {
    pub fn new(notices: NoticeBus) -> Self {
        Self {
            pending: DashMap::new(),
            notices,
        }
    }

    pub fn list(&self) -> Vec<PendingDialog> {
        self.pending
            .iter()
            .map(|entry| PendingDialog {
                id: *entry.key(),
                request: entry.value().request.clone(),
            })
            .collect()
    }

    pub fn answer(&self, id: Uuid, choice: usize) -> Result<(), AnswerError> {
        let buttons = self
            .pending
            .get(&id)
            .map(|entry| entry.request.buttons.len())
            .ok_or(AnswerError::NotFound(id))?;
        if choice >= buttons {
            return Err(AnswerError::ChoiceOutOfRange { choice, buttons });
        }
        let (_, pending) = self.pending.remove(&id).ok_or(AnswerError::NotFound(id))?;
        if pending.answer.send(choice).is_err() {
            warn!(%id, "dialog answered after its caller went away");
        }
        Ok(())
    }

    /// Drop a prompt without choosing. The caller sees the last button.
    pub fn dismiss(&self, id: Uuid) -> bool {
        self.pending.remove(&id).is_some()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

/// Removes the entry if the waiting caller is cancelled before an answer.
struct Parked<'a> {
    pending: &'a DashMap<Uuid, Pending>,
    id: Uuid,
}

impl Drop for Parked<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.id);
    }
}

#[async_trait]
impl Dialog for PendingDialogs {
    async fn show(&self, request: DialogRequest) -> usize {
        let id = Uuid::new_v4();
        let cancel = request.buttons.len().saturating_sub(1);
        let (tx, rx) = oneshot::channel();

        info!(%id, title = %request.title, "dialog waiting for an answer");
        self.pending.insert(
            id,
            Pending {
                request: request.clone(),
                answer: tx,
            },
        );
        let _parked = Parked {
            pending: &self.pending,
            id,
        };
        self.notices
            .publish(NoticeKind::DialogOpened { id, request });

        let choice = match rx.await {
            Ok(choice) => choice,
            Err(_) => {
                debug!(%id, "dialog dismissed");
                cancel
            }
        };
        self.notices.publish(NoticeKind::DialogClosed { id, choice });
        choice
    }
}
