//! Asking the runner.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogRequest {
    pub title: String,
    pub description: String,
    pub buttons: Vec<String>,
}

/// Something that can show a modal prompt and report which button was chosen.
#[async_trait]
pub trait Dialog: Send + Sync {
    async fn show(&self, request: DialogRequest) -> usize;
}

/// Answers every prompt with the same button.
#[derive(Debug, Clone, Copy)]
pub struct FixedChoice(pub usize);

#[async_trait]
impl Dialog for FixedChoice {
    async fn show(&self, _request: DialogRequest) -> usize {
        self.0
    }
}

/// The runner's answer to resetting an attempt with new best times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetDecision {
    SaveBestTimes,
    DiscardBestTimes,
    DontReset,
}

impl ResetDecision {
    pub fn request() -> DialogRequest {
        DialogRequest {
            title: "Save Best Times?".to_string(),
            description: "You have beaten some of your best times. Do you want to update them?"
                .to_string(),
            buttons: vec!["Yes".to_string(), "No".to_string(), "Don't Reset".to_string()],
        }
    }

    /// Any button past "No" cancels.
    pub fn from_choice(choice: usize) -> Self {
        match choice {
            0 => ResetDecision::SaveBestTimes,
            1 => ResetDecision::DiscardBestTimes,
            _ => ResetDecision::DontReset,
        }
    }

    pub fn choice(self) -> usize {
        match self {
            ResetDecision::SaveBestTimes => 0,
            ResetDecision::DiscardBestTimes => 1,
            ResetDecision::DontReset => 2,
        }
    }

    /// The `save_attempt` flag for the reset, or `None` when cancelled.
    pub fn save_attempt(self) -> Option<bool> {
        match self {
            ResetDecision::SaveBestTimes => Some(true),
            ResetDecision::DiscardBestTimes => Some(false),
            ResetDecision::DontReset => None,
        }
    }
}

pub async fn confirm_reset(dialog: &dyn Dialog) -> ResetDecision {
    ResetDecision::from_choice(dialog.show(ResetDecision::request()).await)
}
