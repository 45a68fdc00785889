// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration loading from files.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::{ExplorerConfig, ResolvedConfig};

/// Workspace config file names to search for (in order).
pub const CONFIG_FILES: &[&str] = &[".mcp-explorer.json", ".mcp-explorer.yaml", ".mcp-explorer.yml"];

/// Global config directory name.
pub const GLOBAL_CONFIG_DIR: &str = ".mcp-explorer";

/// Global config file name.
pub const GLOBAL_CONFIG_FILE: &str = "config.json";

/// Get the global config directory path.
pub fn get_global_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(GLOBAL_CONFIG_DIR))
}

/// Get the global config file path.
pub fn get_global_config_path() -> Option<PathBuf> {
    get_global_config_dir().map(|dir| dir.join(GLOBAL_CONFIG_FILE))
}

/// Load global configuration from ~/.mcp-explorer/config.json.
pub fn load_global_config() -> Result<Option<ExplorerConfig>, ConfigError> {
    let path = match get_global_config_path() {
        Some(p) => p,
        None => return Ok(None),
    };

    if !path.exists() {
        return Ok(None);
    }

    load_config_file(&path).map(Some)
}

/// Path of the first workspace config file present in `workspace_root`.
pub fn find_workspace_config(workspace_root: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| workspace_root.join(name))
        .find(|path| path.exists())
}

/// Load workspace configuration from the workspace root.
pub fn load_workspace_config(workspace_root: &Path) -> Result<Option<ExplorerConfig>, ConfigError> {
    match find_workspace_config(workspace_root) {
        Some(path) => load_config_file(&path).map(Some),
        None => Ok(None),
    }
}

/// Load a configuration file (JSON or YAML, by extension).
pub fn load_config_file(path: &Path) -> Result<ExplorerConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(ConfigError::from),
        _ => serde_json::from_str(&content).map_err(ConfigError::from),
    }
}

/// Write a default workspace config file. Refuses to replace an existing one.
pub fn init_config(workspace_root: &Path) -> Result<PathBuf, ConfigError> {
    if let Some(existing) = find_workspace_config(workspace_root) {
        return Err(ConfigError::InvalidValue {
            field: "path".to_string(),
            message: format!("{} already exists", existing.display()),
        });
    }

    let path = workspace_root.join(CONFIG_FILES[0]);
    let content = serde_json::to_string_pretty(&get_example_config())?;
    std::fs::write(&path, content)?;

    Ok(path)
}

/// Every setting at its default value.
pub fn get_example_config() -> ExplorerConfig {
    let defaults = ResolvedConfig::default();
    ExplorerConfig {
        registry_path: Some(defaults.registry_path),
        export_path: Some(defaults.export_path),
        startup_timeout_sec: Some(defaults.startup_timeout_sec),
        request_timeout_sec: Some(defaults.request_timeout_sec),
        shutdown_grace_sec: Some(defaults.shutdown_grace_sec),
        http_timeout_sec: Some(defaults.http_timeout_sec),
        auto_open: Some(defaults.auto_open),
    }
}
