// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration type definitions.
//!
//! Config files hold a partial [`ExplorerConfig`] in JSON or YAML; merging
//! the sources produces a [`ResolvedConfig`] with every field set.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::mcp::ClientOptions;
use crate::mcp::DEFAULT_EXPORT_FILE;
use crate::registry::DEFAULT_REGISTRY_FILE;

/// Explorer configuration as written in a config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerConfig {
    /// Server registry file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_path: Option<PathBuf>,

    /// Default tool export file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_path: Option<PathBuf>,

    /// Seconds allowed for a stdio server to launch and initialize
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startup_timeout_sec: Option<u64>,

    /// Seconds allowed for each stdio request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_sec: Option<u64>,

    /// Seconds a stdio server gets to exit before it is killed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutdown_grace_sec: Option<u64>,

    /// Seconds allowed for each HTTP request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_timeout_sec: Option<u64>,

    /// Whether listing tools may launch a stdio server that is not connected yet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_open: Option<bool>,
}

/// Fully merged configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    pub registry_path: PathBuf,
    pub export_path: PathBuf,
    pub startup_timeout_sec: u64,
    pub request_timeout_sec: u64,
    pub shutdown_grace_sec: u64,
    pub http_timeout_sec: u64,
    pub auto_open: bool,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from(DEFAULT_REGISTRY_FILE),
            export_path: PathBuf::from(DEFAULT_EXPORT_FILE),
            startup_timeout_sec: 30,
            request_timeout_sec: 60,
            shutdown_grace_sec: 5,
            http_timeout_sec: 30,
            auto_open: true,
        }
    }
}

impl ResolvedConfig {
    /// Reject values no client can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let timeouts = [
            ("startupTimeoutSec", self.startup_timeout_sec),
            ("requestTimeoutSec", self.request_timeout_sec),
            ("httpTimeoutSec", self.http_timeout_sec),
        ];
        for (field, value) in timeouts {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "must be at least 1 second".to_string(),
                });
            }
        }

        if self.registry_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "registryPath".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Options for building clients.
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            startup_timeout: Duration::from_secs(self.startup_timeout_sec),
            request_timeout: Duration::from_secs(self.request_timeout_sec),
            shutdown_grace: Duration::from_secs(self.shutdown_grace_sec),
            http_timeout: Duration::from_secs(self.http_timeout_sec),
            auto_open: self.auto_open,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_client_defaults() {
        let config = ResolvedConfig::default();
        assert_eq!(config.registry_path, PathBuf::from("mcp_servers.json"));
        assert_eq!(config.export_path, PathBuf::from("mcp_tools.json"));
        assert_eq!(config.client_options(), ClientOptions::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_parses_camel_case() {
        let config: ExplorerConfig =
            serde_json::from_str(r#"{"registryPath": "servers.json", "autoOpen": false}"#).unwrap();
        assert_eq!(config.registry_path, Some(PathBuf::from("servers.json")));
        assert_eq!(config.auto_open, Some(false));
        assert!(config.http_timeout_sec.is_none());

        let yaml: ExplorerConfig = serde_yaml::from_str("startupTimeoutSec: 5\n").unwrap();
        assert_eq!(yaml.startup_timeout_sec, Some(5));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = ResolvedConfig {
            request_timeout_sec: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "requestTimeoutSec"));
    }
}
