// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tool export document: a JSON object mapping tool name to its full payload.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use super::types::{JsonObject, ToolDescriptor};
use crate::error::RegistryError;
use crate::registry::write_atomic;

/// Default export file name.
pub const DEFAULT_EXPORT_FILE: &str = "mcp_tools.json";

/// Tools keyed by name, in name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ToolExport(BTreeMap<String, JsonObject>);

impl ToolExport {
    /// Build from a tool listing. A later tool replaces an earlier one with
    /// the same name.
    pub fn from_tools(tools: &[ToolDescriptor]) -> Self {
        let mut entries = BTreeMap::new();
        for tool in tools {
            let name = tool.name();
            if name.is_empty() {
                tracing::warn!("skipping unnamed tool in export");
                continue;
            }
            if entries.insert(name.to_string(), tool.payload().clone()).is_some() {
                tracing::debug!(tool = name, "duplicate tool name, keeping the last one");
            }
        }
        Self(entries)
    }

    /// Number of exported tools.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is exported.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Payload for one tool.
    pub fn get(&self, name: &str) -> Option<&JsonObject> {
        self.0.get(name)
    }

    /// Pretty-printed JSON document.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.0)
    }

    /// Write the document, replacing any existing file atomically.
    pub fn write_to(&self, path: &Path) -> Result<(), RegistryError> {
        let failed = |message: String| RegistryError::WriteFailed {
            path: path.display().to_string(),
            message,
        };
        let content = self.to_json_pretty().map_err(|e| failed(e.to_string()))?;
        write_atomic(path, &content).map_err(|e| failed(e.to_string()))?;
        tracing::info!(path = %path.display(), tools = self.len(), "exported tools");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn tool(value: serde_json::Value) -> ToolDescriptor {
        ToolDescriptor::from_value(value).unwrap()
    }

    #[test]
    fn test_from_tools_keys_by_name() {
        let export = ToolExport::from_tools(&[
            tool(json!({"name": "echo", "description": "Echo text"})),
            tool(json!({"name": "add", "inputSchema": {"type": "object"}})),
        ]);

        assert_eq!(export.len(), 2);
        assert_eq!(export.get("add").unwrap()["inputSchema"], json!({"type": "object"}));

        let value: serde_json::Value = serde_json::from_str(&export.to_json_pretty().unwrap()).unwrap();
        assert_eq!(value["echo"]["description"], "Echo text");
        assert_eq!(value["echo"]["name"], "echo");
    }

    #[test]
    fn test_later_duplicate_wins() {
        let export = ToolExport::from_tools(&[
            tool(json!({"name": "add", "description": "first"})),
            tool(json!({"name": "add", "description": "second"})),
        ]);
        assert_eq!(export.len(), 1);
        assert_eq!(export.get("add").unwrap()["description"], "second");
    }

    #[test]
    fn test_empty_export() {
        let export = ToolExport::from_tools(&[]);
        assert!(export.is_empty());
        assert_eq!(export.to_json_pretty().unwrap(), "{}");
    }

    #[test]
    fn test_write_to_creates_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("tools.json");

        let export = ToolExport::from_tools(&[tool(json!({"name": "add"}))]);
        export.write_to(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, export.to_json_pretty().unwrap());
        assert!(!dir.path().join("out").join("tools.json.tmp").exists());
    }
}
