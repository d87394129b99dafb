//! Bootstrap configuration - seeds the timer at startup, then the timer owns it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The run loaded into the timer on startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub game: String,

    #[serde(default)]
    pub category: String,

    /// Segment names in order. A timer needs at least one.
    #[serde(default = "RunConfig::default_segments")]
    pub segments: Vec<String>,
}

impl RunConfig {
    fn default_segments() -> Vec<String> {
        vec!["Time".to_string()]
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            game: String::new(),
            category: String::new(),
            segments: Self::default_segments(),
        }
    }
}

/// What to do when a reset would discard new best times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetPolicy {
    /// Park a prompt until a collaborator answers it.
    #[default]
    Ask,
    Save,
    Discard,
}

impl ResetPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ResetPolicy::Ask => "ask",
            ResetPolicy::Save => "save",
            ResetPolicy::Discard => "discard",
        }
    }
}

impl fmt::Display for ResetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResetPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ask" => Ok(ResetPolicy::Ask),
            "save" => Ok(ResetPolicy::Save),
            "discard" => Ok(ResetPolicy::Discard),
            other => Err(format!("expected ask, save or discard, got `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetConfig {
    #[serde(default)]
    pub on_new_best_times: ResetPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub reset: ResetConfig,
}
