// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration merging.

use std::path::PathBuf;

use super::types::{ExplorerConfig, ResolvedConfig};

/// CLI options that can override configuration.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub registry_path: Option<PathBuf>,
    pub export_path: Option<PathBuf>,
    pub startup_timeout_sec: Option<u64>,
    pub request_timeout_sec: Option<u64>,
    pub http_timeout_sec: Option<u64>,
    pub no_auto_open: bool,
}

/// Default configuration values.
pub fn default_config() -> ResolvedConfig {
    ResolvedConfig::default()
}

/// Merge configurations with precedence.
///
/// Precedence (highest to lowest):
/// 1. CLI options
/// 2. Workspace config (.mcp-explorer.json / .yaml / .yml)
/// 3. Global config (~/.mcp-explorer/config.json)
/// 4. Default values
pub fn merge_config(
    global: Option<ExplorerConfig>,
    workspace: Option<ExplorerConfig>,
    cli: CliOptions,
) -> ResolvedConfig {
    let mut result = default_config();

    for config in [global, workspace].into_iter().flatten() {
        apply_explorer_config(&mut result, &config);
    }

    apply_cli_options(&mut result, &cli);
    result
}

fn apply_explorer_config(result: &mut ResolvedConfig, config: &ExplorerConfig) {
    if let Some(ref path) = config.registry_path {
        result.registry_path = path.clone();
    }
    if let Some(ref path) = config.export_path {
        result.export_path = path.clone();
    }
    if let Some(secs) = config.startup_timeout_sec {
        result.startup_timeout_sec = secs;
    }
    if let Some(secs) = config.request_timeout_sec {
        result.request_timeout_sec = secs;
    }
    if let Some(secs) = config.shutdown_grace_sec {
        result.shutdown_grace_sec = secs;
    }
    if let Some(secs) = config.http_timeout_sec {
        result.http_timeout_sec = secs;
    }
    if let Some(auto_open) = config.auto_open {
        result.auto_open = auto_open;
    }
}

fn apply_cli_options(result: &mut ResolvedConfig, cli: &CliOptions) {
    if let Some(ref path) = cli.registry_path {
        result.registry_path = path.clone();
    }
    if let Some(ref path) = cli.export_path {
        result.export_path = path.clone();
    }
    if let Some(secs) = cli.startup_timeout_sec {
        result.startup_timeout_sec = secs;
    }
    if let Some(secs) = cli.request_timeout_sec {
        result.request_timeout_sec = secs;
    }
    if let Some(secs) = cli.http_timeout_sec {
        result.http_timeout_sec = secs;
    }
    if cli.no_auto_open {
        result.auto_open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_defaults_only() {
        let config = merge_config(None, None, CliOptions::default());
        assert_eq!(config, ResolvedConfig::default());
    }

    #[test]
    fn test_workspace_overrides_global() {
        let global = ExplorerConfig {
            registry_path: Some(PathBuf::from("/home/me/servers.json")),
            http_timeout_sec: Some(5),
            ..Default::default()
        };
        let workspace = ExplorerConfig {
            registry_path: Some(PathBuf::from("servers.json")),
            ..Default::default()
        };

        let config = merge_config(Some(global), Some(workspace), CliOptions::default());
        assert_eq!(config.registry_path, PathBuf::from("servers.json"));
        assert_eq!(config.http_timeout_sec, 5);
        assert_eq!(config.request_timeout_sec, 60);
    }

    #[test]
    fn test_cli_wins() {
        let workspace = ExplorerConfig {
            registry_path: Some(PathBuf::from("servers.json")),
            auto_open: Some(true),
            startup_timeout_sec: Some(10),
            ..Default::default()
        };
        let cli = CliOptions {
            registry_path: Some(PathBuf::from("cli.json")),
            startup_timeout_sec: Some(3),
            no_auto_open: true,
            ..Default::default()
        };

        let config = merge_config(None, Some(workspace), cli);
        assert_eq!(config.registry_path, PathBuf::from("cli.json"));
        assert_eq!(config.startup_timeout_sec, 3);
        assert!(!config.auto_open);
    }
}
