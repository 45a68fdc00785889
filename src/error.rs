// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for the MCP explorer.
//!
//! Library code returns strongly-typed errors defined with `thiserror`:
//! [`ConfigError`] for explorer configuration, [`RegistryError`] for the
//! server registry file, and [`crate::mcp::McpError`] for everything that
//! talks to a server. Application code propagates them through `anyhow`.

use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("IO error reading config: {0}")]
    IoError(String),

    #[error("YAML parsing error: {0}")]
    YamlError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::IoError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::YamlError(err.to_string())
    }
}

/// Errors that can occur while reading, validating or writing the server registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to read registry '{path}': {message}")]
    ReadFailed { path: String, message: String },

    #[error("Registry '{path}' is corrupt: {message}")]
    Corrupt { path: String, message: String },

    #[error("Failed to write registry '{path}': {message}")]
    WriteFailed { path: String, message: String },

    #[error("Invalid server descriptor '{name}': {message}")]
    InvalidDescriptor { name: String, message: String },

    #[error("Server not found: {0}")]
    ServerNotFound(String),
}

impl RegistryError {
    /// Create an invalid descriptor error.
    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Whether the error came from a damaged file rather than an I/O failure.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}

/// Result type alias using anyhow for flexible error handling.
pub type Result<T> = anyhow::Result<T>;
