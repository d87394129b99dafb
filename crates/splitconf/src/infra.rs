//! Infrastructure configuration - fixed for the life of the process.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Network bind addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindConfig {
    /// HTTP/WebSocket listener for remote control and collaborators.
    /// Default: 127.0.0.1:16834
    #[serde(default = "BindConfig::default_http_addr")]
    pub http_addr: String,
}

impl BindConfig {
    fn default_http_addr() -> String {
        "127.0.0.1:16834".to_string()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.http_addr.parse().map_err(|_| ConfigError::Invalid {
            key: "bind.http_addr".to_string(),
            message: format!("`{}` is not a socket address", self.http_addr),
        })
    }
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            http_addr: Self::default_http_addr(),
        }
    }
}

/// Logging and tracing export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// OTLP gRPC endpoint. Empty disables export.
    #[serde(default)]
    pub otlp_endpoint: String,

    /// EnvFilter directive, e.g. `info` or `splitd=debug,splitcore=trace`.
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }

    pub fn otlp_enabled(&self) -> bool {
        !self.otlp_endpoint.trim().is_empty()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: String::new(),
            log_level: Self::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfraConfig {
    #[serde(default)]
    pub bind: BindConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_defaults() {
        let bind = BindConfig::default();
        assert_eq!(bind.http_addr, "127.0.0.1:16834");
        assert_eq!(bind.socket_addr().unwrap().port(), 16834);
    }

    #[test]
    fn test_bad_bind_addr() {
        let bind = BindConfig {
            http_addr: "localhost".to_string(),
        };
        assert!(matches!(
            bind.socket_addr(),
            Err(ConfigError::Invalid { key, .. }) if key == "bind.http_addr"
        ));
    }

    #[test]
    fn test_telemetry_defaults() {
        let telemetry = TelemetryConfig::default();
        assert_eq!(telemetry.log_level, "info");
        assert!(!telemetry.otlp_enabled());
    }
}
