//! Config file discovery, loading, and environment variable overlay.

use crate::bootstrap::{BootstrapConfig, ResetConfig, ResetPolicy, RunConfig};
use crate::infra::{BindConfig, InfraConfig, TelemetryConfig};
use crate::{ConfigError, SplitConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local). Only returns files that
/// exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/splitshell/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("splitshell/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("splitshell.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

pub fn load_from_file(path: &Path) -> Result<SplitConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_toml(&contents, path)
}

/// Parse one file. Keys that are absent keep their defaults so that
/// [`merge_configs`] can tell them apart from explicit values.
pub fn parse_toml(contents: &str, path: &Path) -> Result<SplitConfig, ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut infra = InfraConfig::default();
    if let Some(bind) = table.get("bind").and_then(|v| v.as_table()) {
        if let Some(v) = bind.get("http_addr").and_then(|v| v.as_str()) {
            infra.bind.http_addr = v.to_string();
        }
    }
    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = telemetry.get("otlp_endpoint").and_then(|v| v.as_str()) {
            infra.telemetry.otlp_endpoint = v.to_string();
        }
        if let Some(v) = telemetry.get("log_level").and_then(|v| v.as_str()) {
            infra.telemetry.log_level = v.to_string();
        }
    }

    let mut bootstrap = BootstrapConfig::default();
    if let Some(section) = table.get("bootstrap").and_then(|v| v.as_table()) {
        if let Some(run) = section.get("run").and_then(|v| v.as_table()) {
            if let Some(v) = run.get("game").and_then(|v| v.as_str()) {
                bootstrap.run.game = v.to_string();
            }
            if let Some(v) = run.get("category").and_then(|v| v.as_str()) {
                bootstrap.run.category = v.to_string();
            }
            if let Some(segments) = run.get("segments").and_then(|v| v.as_array()) {
                bootstrap.run.segments = segments
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(str::to_string)
                    .collect();
                if bootstrap.run.segments.is_empty() {
                    return Err(ConfigError::Invalid {
                        key: "bootstrap.run.segments".to_string(),
                        message: "a run needs at least one segment".to_string(),
                    });
                }
            }
        }
        if let Some(reset) = section.get("reset").and_then(|v| v.as_table()) {
            if let Some(v) = reset.get("on_new_best_times").and_then(|v| v.as_str()) {
                bootstrap.reset.on_new_best_times =
                    v.parse().map_err(|message| ConfigError::Invalid {
                        key: "bootstrap.reset.on_new_best_times".to_string(),
                        message,
                    })?;
            }
        }
    }

    Ok(SplitConfig { infra, bootstrap })
}

fn pick<T: PartialEq>(base: T, overlay: T, default: T) -> T {
    if overlay != default {
        overlay
    } else {
        base
    }
}

/// Merge two configs field by field, with non-default `overlay` values
/// taking precedence.
pub fn merge_configs(base: SplitConfig, overlay: SplitConfig) -> SplitConfig {
    let bind = BindConfig::default();
    let telemetry = TelemetryConfig::default();
    let run = RunConfig::default();
    let reset = ResetConfig::default();

    SplitConfig {
        infra: InfraConfig {
            bind: BindConfig {
                http_addr: pick(
                    base.infra.bind.http_addr,
                    overlay.infra.bind.http_addr,
                    bind.http_addr,
                ),
            },
            telemetry: TelemetryConfig {
                otlp_endpoint: pick(
                    base.infra.telemetry.otlp_endpoint,
                    overlay.infra.telemetry.otlp_endpoint,
                    telemetry.otlp_endpoint,
                ),
                log_level: pick(
                    base.infra.telemetry.log_level,
                    overlay.infra.telemetry.log_level,
                    telemetry.log_level,
                ),
            },
        },
        bootstrap: BootstrapConfig {
            run: RunConfig {
                game: pick(base.bootstrap.run.game, overlay.bootstrap.run.game, run.game),
                category: pick(
                    base.bootstrap.run.category,
                    overlay.bootstrap.run.category,
                    run.category,
                ),
                segments: pick(
                    base.bootstrap.run.segments,
                    overlay.bootstrap.run.segments,
                    run.segments,
                ),
            },
            reset: ResetConfig {
                on_new_best_times: pick(
                    base.bootstrap.reset.on_new_best_times,
                    overlay.bootstrap.reset.on_new_best_times,
                    reset.on_new_best_times,
                ),
            },
        },
    }
}

/// Apply environment variable overrides from the process environment.
pub fn apply_env_overrides(config: &mut SplitConfig, sources: &mut ConfigSources) {
    apply_env_overrides_from(config, sources, env::vars());
}

/// Apply overrides from an explicit set of variables.
pub fn apply_env_overrides_from<I>(config: &mut SplitConfig, sources: &mut ConfigSources, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut otel_endpoint = None;
    let mut rust_log = None;

    for (key, value) in vars {
        let applied = match key.as_str() {
            "SPLITSHELL_HTTP_ADDR" => {
                config.infra.bind.http_addr = value;
                true
            }
            "SPLITSHELL_OTLP_ENDPOINT" => {
                config.infra.telemetry.otlp_endpoint = value;
                true
            }
            "SPLITSHELL_LOG_LEVEL" => {
                config.infra.telemetry.log_level = value;
                true
            }
            "SPLITSHELL_GAME" => {
                config.bootstrap.run.game = value;
                true
            }
            "SPLITSHELL_CATEGORY" => {
                config.bootstrap.run.category = value;
                true
            }
            "SPLITSHELL_SEGMENTS" => {
                let segments: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                let valid = !segments.is_empty();
                if valid {
                    config.bootstrap.run.segments = segments;
                }
                valid
            }
            "SPLITSHELL_RESET_POLICY" => match value.parse::<ResetPolicy>() {
                Ok(policy) => {
                    config.bootstrap.reset.on_new_best_times = policy;
                    true
                }
                Err(_) => false,
            },
            // Standard variables win over ours; applied after the loop
            "OTEL_EXPORTER_OTLP_ENDPOINT" => {
                otel_endpoint = Some(value);
                false
            }
            "RUST_LOG" => {
                rust_log = Some(value);
                false
            }
            _ => false,
        };
        if applied {
            sources.env_overrides.push(key);
        }
    }

    if let Some(v) = otel_endpoint {
        config.infra.telemetry.otlp_endpoint = v;
        sources
            .env_overrides
            .push("OTEL_EXPORTER_OTLP_ENDPOINT".to_string());
    }
    if let Some(v) = rust_log {
        config.infra.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }
}
