//! Configuration loading for splitshell.
//!
//! Configuration is split into two categories:
//!
//! - **Infrastructure** (`InfraConfig`): things fixed for the life of the
//!   process - the listen address and telemetry.
//! - **Bootstrap** (`BootstrapConfig`): the run the timer starts with and the
//!   reset policy. After startup the timer is the source of truth.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/splitshell/config.toml` (system)
//! 2. `~/.config/splitshell/config.toml` (user)
//! 3. `./splitshell.toml` (local override) or the `--config` path
//! 4. Environment variables (`SPLITSHELL_*`, plus `RUST_LOG` and
//!    `OTEL_EXPORTER_OTLP_ENDPOINT`)
//!
//! # Example Config
//!
//! ```toml
//! [bind]
//! http_addr = "127.0.0.1:16834"
//!
//! [telemetry]
//! log_level = "info"
//! otlp_endpoint = ""
//!
//! [bootstrap.run]
//! game = "Quest"
//! category = "Any%"
//! segments = ["Forest", "Castle", "Tower"]
//!
//! [bootstrap.reset]
//! on_new_best_times = "ask"
//! ```

pub mod bootstrap;
pub mod infra;
pub mod loader;

pub use bootstrap::{BootstrapConfig, ResetConfig, ResetPolicy, RunConfig};
pub use infra::{BindConfig, InfraConfig, TelemetryConfig};
pub use loader::{discover_config_files_with_override, ConfigSources};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Complete splitshell configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitConfig {
    #[serde(flatten)]
    pub infra: InfraConfig,

    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl SplitConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load with `config_path` in place of `./splitshell.toml`. System and
    /// user files still load first.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = SplitConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            let file_config = loader::load_from_file(&path)?;
            config = loader::merge_configs(config, file_config);
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Serialize config to a TOML string.
    pub fn to_toml(&self) -> String {
        // Built by hand for stable ordering and comments
        let mut output = String::new();

        output.push_str("# splitshell configuration\n\n");

        output.push_str("[bind]\n");
        output.push_str(&format!("http_addr = {:?}\n", self.infra.bind.http_addr));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!(
            "otlp_endpoint = {:?}\n",
            self.infra.telemetry.otlp_endpoint
        ));
        output.push_str(&format!(
            "log_level = {:?}\n",
            self.infra.telemetry.log_level
        ));

        output.push_str("\n[bootstrap.run]\n");
        output.push_str(&format!("game = {:?}\n", self.bootstrap.run.game));
        output.push_str(&format!("category = {:?}\n", self.bootstrap.run.category));
        output.push_str("segments = [\n");
        for segment in &self.bootstrap.run.segments {
            output.push_str(&format!("    {:?},\n", segment));
        }
        output.push_str("]\n");

        output.push_str("\n[bootstrap.reset]\n");
        output.push_str(&format!(
            "on_new_best_times = \"{}\"\n",
            self.bootstrap.reset.on_new_best_times
        ));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SplitConfig::default();
        assert_eq!(config.infra.bind.http_addr, "127.0.0.1:16834");
        assert_eq!(config.bootstrap.run.segments.len(), 1);
    }

    #[test]
    fn test_to_toml_round_trips() {
        let mut config = SplitConfig::default();
        config.bootstrap.run.game = "Quest \"Deluxe\"".to_string();
        config.bootstrap.run.segments = vec!["A".to_string(), "B".to_string()];
        config.bootstrap.reset.on_new_best_times = ResetPolicy::Save;

        let toml = config.to_toml();
        assert!(toml.contains("[bind]"));
        assert!(toml.contains("[bootstrap.reset]"));
        let parsed = loader::parse_toml(&toml, Path::new("printed.toml")).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[bootstrap.run]\ngame = \"Quest\"\nsegments = [\"Forest\", \"Castle\"]"
        )
        .unwrap();

        let (config, sources) = SplitConfig::load_with_sources_from(Some(file.path())).unwrap();
        assert!(sources.files.iter().any(|p| p == file.path()));
        assert_eq!(config.bootstrap.run.segments, vec!["Forest", "Castle"]);
    }

    #[test]
    fn test_unreadable_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = loader::load_from_file(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
        assert!(err.to_string().contains("missing.toml"));
    }
}
