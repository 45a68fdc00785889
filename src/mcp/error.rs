// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! MCP error types.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during MCP operations.
///
/// Every variant carries owned strings so the client can retain a copy as its
/// last reported error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum McpError {
    /// Bad constructor combination or unsupported protocol value.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Process launch, handshake or network failure.
    #[error("Failed to connect to MCP server '{server}': {message}")]
    Connection { server: String, message: String },

    /// The launch/handshake window elapsed.
    #[error("Connection to MCP server '{server}' timed out after {timeout:?}")]
    ConnectionTimeout { server: String, timeout: Duration },

    /// Malformed or unexpected server response.
    #[error("Invalid response from MCP server: {0}")]
    Protocol(String),

    /// JSON-RPC error object returned by the server.
    #[error("Protocol error: code={code}, message={message}")]
    Rpc { code: i64, message: String },

    /// Operation needs a live session and none is available.
    #[error("MCP server '{0}' is not connected")]
    NotConnected(String),

    /// The server subprocess exited before cleanup.
    #[error("MCP server '{server}' process terminated: {status}")]
    ProcessTerminated { server: String, status: String },

    /// A pending operation was abandoned through the cancel handle.
    #[error("Operation on MCP server '{0}' was cancelled")]
    Cancelled(String),
}

impl McpError {
    /// Create a connection error.
    pub fn connection(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            server: server.into(),
            message: message.into(),
        }
    }

    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Create a JSON-RPC error.
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    /// User-facing category label.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration(_) => "configuration",
            Self::Connection { .. } | Self::ConnectionTimeout { .. } => "connection",
            Self::Protocol(_) | Self::Rpc { .. } => "protocol",
            Self::NotConnected(_) => "not connected",
            Self::ProcessTerminated { .. } => "process terminated",
            Self::Cancelled(_) => "cancelled",
        }
    }

    /// Whether this error belongs to the connection family.
    ///
    /// A subprocess that exits on its own surfaces as a connection failure.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::ConnectionTimeout { .. } | Self::ProcessTerminated { .. }
        )
    }
}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = McpError::NotConnected("local".to_string());
        assert!(err.to_string().contains("local"));

        let err = McpError::rpc(-32600, "Invalid Request");
        assert!(err.to_string().contains("-32600"));
        assert!(err.to_string().contains("Invalid Request"));

        let err = McpError::ConnectionTimeout {
            server: "slow".to_string(),
            timeout: Duration::from_secs(30),
        };
        assert!(err.to_string().contains("after 30s"));

        let err = McpError::ConnectionTimeout {
            server: "slow".to_string(),
            timeout: Duration::from_millis(500),
        };
        assert!(err.to_string().contains("after 500ms"), "{err}");
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(McpError::config("x").category(), "configuration");
        assert_eq!(McpError::connection("s", "refused").category(), "connection");
        assert_eq!(McpError::protocol("bad").category(), "protocol");
        assert_eq!(McpError::rpc(1, "x").category(), "protocol");
        assert_eq!(McpError::NotConnected("s".into()).category(), "not connected");
        assert_eq!(McpError::Cancelled("s".into()).category(), "cancelled");
    }

    #[test]
    fn test_connection_family() {
        assert!(McpError::connection("s", "refused").is_connection_error());
        assert!(McpError::ProcessTerminated {
            server: "s".into(),
            status: "exit status: 1".into()
        }
        .is_connection_error());
        assert!(!McpError::protocol("bad").is_connection_error());
        assert!(!McpError::NotConnected("s".into()).is_connection_error());
    }

    #[test]
    fn test_from_json_error() {
        let err: McpError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, McpError::Protocol(_)));
    }
}
