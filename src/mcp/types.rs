// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! MCP types for server metadata, tools and session state.
//!
//! Server metadata and tool descriptors are opaque JSON objects: the explorer
//! passes them through to display and export without interpreting them.

use serde::{Deserialize, Serialize};

use super::error::McpError;

/// A JSON object with string keys.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Opaque key-value metadata describing a connected server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerInfo(JsonObject);

impl ServerInfo {
    /// Wrap a JSON object.
    pub fn new(fields: JsonObject) -> Self {
        Self(fields)
    }

    /// Build from an arbitrary JSON value, which must be an object.
    pub fn from_value(value: serde_json::Value) -> Result<Self, McpError> {
        match value {
            serde_json::Value::Object(map) => Ok(Self(map)),
            other => Err(McpError::protocol(format!(
                "expected server info object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Look up a top-level field.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Server name from an MCP initialize result (`serverInfo.name`) or a flat `name`.
    pub fn name(&self) -> Option<&str> {
        self.0
            .get("serverInfo")
            .and_then(|s| s.get("name"))
            .or_else(|| self.0.get("name"))
            .and_then(|v| v.as_str())
    }

    /// Whether no metadata is present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying object.
    pub fn as_object(&self) -> &JsonObject {
        &self.0
    }

    /// Consume into the underlying object.
    pub fn into_inner(self) -> JsonObject {
        self.0
    }
}

/// A named capability descriptor exposed by a server.
///
/// The whole server-provided object is retained; only `name` is required.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ToolDescriptor(JsonObject);

impl ToolDescriptor {
    /// Build from a JSON value, which must be an object with a string `name`.
    pub fn from_value(value: serde_json::Value) -> Result<Self, McpError> {
        let map = match value {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(McpError::protocol(format!(
                    "expected tool object, got {}",
                    json_kind(&other)
                )))
            }
        };

        match map.get("name") {
            Some(serde_json::Value::String(_)) => Ok(Self(map)),
            _ => Err(McpError::protocol("tool descriptor is missing a string 'name'")),
        }
    }

    /// Tool name.
    pub fn name(&self) -> &str {
        self.0
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
    }

    /// Tool description, if the server provided one.
    pub fn description(&self) -> Option<&str> {
        self.0.get("description").and_then(|v| v.as_str())
    }

    /// Full descriptor payload.
    pub fn payload(&self) -> &JsonObject {
        &self.0
    }

    /// Consume into the payload.
    pub fn into_payload(self) -> JsonObject {
        self.0
    }
}

impl<'de> Deserialize<'de> for ToolDescriptor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

/// Parse a JSON array of tool descriptors.
pub fn parse_tools(value: serde_json::Value) -> Result<Vec<ToolDescriptor>, McpError> {
    match value {
        serde_json::Value::Array(items) => items.into_iter().map(ToolDescriptor::from_value).collect(),
        other => Err(McpError::protocol(format!(
            "expected 'tools' array, got {}",
            json_kind(&other)
        ))),
    }
}

/// Lifecycle state of a transport session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Nothing launched yet.
    Unopened,

    /// Subprocess is being spawned.
    Launching,

    /// Streams attached, initialize exchange in progress.
    Initializing,

    /// Handshake complete; requests are legal.
    Ready,

    /// Resources released. Terminal.
    Closed,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Unopened
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unopened => write!(f, "unopened"),
            Self::Launching => write!(f, "launching"),
            Self::Initializing => write!(f, "initializing"),
            Self::Ready => write!(f, "ready"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Why a session reached `Closed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Explicit cleanup.
    Cleanup,

    /// Cancel handle fired.
    Cancelled,

    /// Launch or handshake failed.
    Failed,

    /// A live session broke (I/O failure or timeout).
    Broken,

    /// The subprocess exited on its own.
    Terminated(String),
}

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_server_info_from_value() {
        let info = ServerInfo::from_value(json!({"name": "demo", "version": "1.0"})).unwrap();
        assert_eq!(info.name(), Some("demo"));
        assert!(!info.is_empty());

        let err = ServerInfo::from_value(json!([1, 2])).unwrap_err();
        assert!(matches!(err, McpError::Protocol(_)));
    }

    #[test]
    fn test_server_info_name_from_initialize_result() {
        let info = ServerInfo::from_value(json!({
            "protocolVersion": "2024-11-05",
            "serverInfo": {"name": "echo", "version": "0.1.0"}
        }))
        .unwrap();
        assert_eq!(info.name(), Some("echo"));
    }

    #[test]
    fn test_tool_descriptor_keeps_payload() {
        let tool = ToolDescriptor::from_value(json!({
            "name": "add",
            "description": "Add two numbers",
            "inputSchema": {"type": "object"},
            "x-vendor": 7
        }))
        .unwrap();

        assert_eq!(tool.name(), "add");
        assert_eq!(tool.description(), Some("Add two numbers"));
        assert_eq!(tool.payload().get("x-vendor"), Some(&json!(7)));
    }

    #[test]
    fn test_tool_descriptor_requires_name() {
        assert!(ToolDescriptor::from_value(json!({"description": "nameless"})).is_err());
        assert!(ToolDescriptor::from_value(json!({"name": 5})).is_err());
        assert!(ToolDescriptor::from_value(json!("add")).is_err());
    }

    #[test]
    fn test_tool_descriptor_deserialize() {
        let tools: Vec<ToolDescriptor> =
            serde_json::from_str(r#"[{"name": "a"}, {"name": "b", "inputSchema": {}}]"#).unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[1].name(), "b");

        let bad: Result<Vec<ToolDescriptor>, _> = serde_json::from_str(r#"[{"title": "a"}]"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_parse_tools() {
        let tools = parse_tools(json!([{"name": "a"}])).unwrap();
        assert_eq!(tools.len(), 1);
        assert!(parse_tools(json!({"name": "a"})).is_err());
    }

    #[test]
    fn test_session_state_display() {
        assert_eq!(SessionState::default(), SessionState::Unopened);
        assert_eq!(SessionState::Ready.to_string(), "ready");
        assert_eq!(SessionState::Closed.to_string(), "closed");
    }
}
