// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Server descriptor types.
//!
//! A descriptor is a named record of how to reach one MCP server. On disk the
//! registry is a JSON object keyed by server name:
//!
//! ```json
//! {
//!   "weather": { "protocol": "http", "url": "http://localhost:8000" },
//!   "local":   { "protocol": "stdio", "command": "uv run", "program": "/srv/server.py" }
//! }
//! ```

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::mcp::McpError;

/// Transport protocol used to reach a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Stateless HTTP request/response.
    Http,

    /// Long-lived subprocess speaking over its standard streams.
    Stdio,
}

impl Protocol {
    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Stdio => "stdio",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = McpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "stdio" => Ok(Self::Stdio),
            other => Err(McpError::InvalidConfiguration(format!(
                "Unsupported protocol: {}",
                other
            ))),
        }
    }
}

/// The persisted value stored under a server name.
///
/// Fields this crate does not know about are kept in `extra` so that a
/// load/save cycle does not drop them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRecord {
    /// Transport protocol.
    pub protocol: Protocol,

    /// Endpoint for HTTP servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Launcher command for stdio servers (may carry leading arguments).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Server program passed as the final launcher argument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,

    /// Unrecognized fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ServerRecord {
    /// Create an HTTP record.
    pub fn http(url: impl Into<String>) -> Self {
        Self {
            protocol: Protocol::Http,
            url: Some(url.into()),
            command: None,
            program: None,
            extra: BTreeMap::new(),
        }
    }

    /// Create a stdio record.
    pub fn stdio(command: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            protocol: Protocol::Stdio,
            url: None,
            command: Some(command.into()),
            program: Some(program.into()),
            extra: BTreeMap::new(),
        }
    }

    /// Human-readable endpoint summary (URL or launch line).
    pub fn endpoint(&self) -> String {
        match self.protocol {
            Protocol::Http => self.url.clone().unwrap_or_default(),
            Protocol::Stdio => {
                let command = self.command.as_deref().unwrap_or_default();
                let program = self.program.as_deref().unwrap_or_default();
                format!("{} {}", command, program).trim().to_string()
            }
        }
    }
}

/// A named server descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerDescriptor {
    /// Unique, human-chosen name.
    pub name: String,

    /// Connection parameters.
    pub record: ServerRecord,
}

impl ServerDescriptor {
    /// Create a descriptor from a name and record.
    pub fn new(name: impl Into<String>, record: ServerRecord) -> Self {
        Self {
            name: name.into(),
            record,
        }
    }

    /// Create an HTTP descriptor.
    pub fn http(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(name, ServerRecord::http(url))
    }

    /// Create a stdio descriptor.
    pub fn stdio(
        name: impl Into<String>,
        command: impl Into<String>,
        program: impl Into<String>,
    ) -> Self {
        Self::new(name, ServerRecord::stdio(command, program))
    }

    /// Protocol of this descriptor.
    pub fn protocol(&self) -> Protocol {
        self.record.protocol
    }

    /// Check that exactly the fields required by the protocol are present and non-empty.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.name.trim().is_empty() {
            return Err(RegistryError::invalid(&self.name, "server name must not be empty"));
        }

        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
        let record = &self.record;

        match record.protocol {
            Protocol::Http => {
                if !present(&record.url) {
                    return Err(RegistryError::invalid(&self.name, "http server requires 'url'"));
                }
                if record.command.is_some() || record.program.is_some() {
                    return Err(RegistryError::invalid(
                        &self.name,
                        "http server must not set 'command' or 'program'",
                    ));
                }
            }
            Protocol::Stdio => {
                if !present(&record.command) {
                    return Err(RegistryError::invalid(&self.name, "stdio server requires 'command'"));
                }
                if !present(&record.program) {
                    return Err(RegistryError::invalid(&self.name, "stdio server requires 'program'"));
                }
                if record.url.is_some() {
                    return Err(RegistryError::invalid(&self.name, "stdio server must not set 'url'"));
                }
            }
        }

        Ok(())
    }
}
