// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration for the explorer.
//!
//! Sources, merged with precedence (CLI > workspace > global > defaults):
//! - Global config: ~/.mcp-explorer/config.json
//! - Workspace config: .mcp-explorer.json, .mcp-explorer.yaml or .mcp-explorer.yml
//! - CLI options: command-line arguments and their environment fallbacks

mod loader;
mod merger;
mod types;

pub use loader::{
    find_workspace_config, get_example_config, get_global_config_dir, get_global_config_path,
    init_config, load_config_file, load_global_config, load_workspace_config, CONFIG_FILES,
    GLOBAL_CONFIG_DIR, GLOBAL_CONFIG_FILE,
};
pub use merger::{default_config, merge_config, CliOptions};
pub use types::{ExplorerConfig, ResolvedConfig};

use crate::error::ConfigError;
use std::path::Path;

/// Load, merge and validate all configuration sources for a workspace.
pub fn load_config(workspace_root: &Path, cli_options: CliOptions) -> Result<ResolvedConfig, ConfigError> {
    let global = load_global_config()?;
    let workspace = load_workspace_config(workspace_root)?;

    let config = merge_config(global, workspace, cli_options);
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_with_workspace_config() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".mcp-explorer.json"),
            r#"{"registryPath": "team.json", "exportPath": "tools.json"}"#,
        )
        .unwrap();

        let config = load_config(temp.path(), CliOptions::default()).unwrap();
        assert_eq!(config.registry_path, PathBuf::from("team.json"));
        assert_eq!(config.export_path, PathBuf::from("tools.json"));
    }

    #[test]
    fn test_load_config_cli_override() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".mcp-explorer.json"), r#"{"registryPath": "team.json"}"#).unwrap();

        let cli = CliOptions {
            registry_path: Some(PathBuf::from("mine.json")),
            ..Default::default()
        };

        let config = load_config(temp.path(), cli).unwrap();
        assert_eq!(config.registry_path, PathBuf::from("mine.json"));
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".mcp-explorer.json"), r#"{"httpTimeoutSec": 0}"#).unwrap();

        let cli = CliOptions {
            http_timeout_sec: None,
            ..Default::default()
        };
        let err = load_config(temp.path(), cli).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
