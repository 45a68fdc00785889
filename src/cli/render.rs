// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Terminal rendering for registry entries, server metadata and tools.

use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{json, Value};

use crate::error::{ConfigError, RegistryError};
use crate::mcp::{McpError, ServerInfo, ToolDescriptor};
use crate::registry::{Protocol, Registry};

/// Category label for any application error.
pub fn category(err: &anyhow::Error) -> &'static str {
    if let Some(err) = err.downcast_ref::<McpError>() {
        err.category()
    } else if err.downcast_ref::<RegistryError>().is_some() {
        "registry"
    } else if err.downcast_ref::<ConfigError>().is_some() {
        "configuration"
    } else {
        "error"
    }
}

/// Print a category-labeled failure to stderr.
pub fn print_failure(err: &anyhow::Error) {
    eprintln!("{} {:#}", format!("[{}]", category(err)).red().bold(), err);
}

/// Print an MCP error to stderr.
pub fn print_error(err: &McpError) {
    eprintln!("{} {}", format!("[{}]", err.category()).red().bold(), err);
}

/// Print a non-fatal problem to stderr.
pub fn print_warning(label: &str, message: impl std::fmt::Display) {
    eprintln!("{} {}", format!("[{}]", label).yellow().bold(), message);
}

/// Registry listing as aligned text.
pub fn format_servers(registry: &Registry, protocol: Option<Protocol>) -> String {
    let rows: Vec<(String, &str, String)> = registry
        .iter()
        .filter(|(_, record)| protocol.map_or(true, |p| record.protocol == p))
        .map(|(name, record)| (name.clone(), record.protocol.as_str(), record.endpoint()))
        .collect();

    if rows.is_empty() {
        return "No servers registered.".to_string();
    }

    let width = rows.iter().map(|(name, _, _)| name.len()).max().unwrap_or(0);
    rows.iter()
        .map(|(name, protocol, endpoint)| format!("{:<width$}  {:<5}  {}", name, protocol, endpoint))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Registry listing as JSON, keyed by name like the registry file.
pub fn servers_json(registry: &Registry, protocol: Option<Protocol>) -> Value {
    let entries: serde_json::Map<String, Value> = registry
        .iter()
        .filter(|(_, record)| protocol.map_or(true, |p| record.protocol == p))
        .map(|(name, record)| (name.clone(), json!(record)))
        .collect();
    Value::Object(entries)
}

pub fn format_server_info(info: &ServerInfo) -> String {
    if info.is_empty() {
        return "(no server info)".to_string();
    }
    serde_json::to_string_pretty(info).unwrap_or_else(|_| format!("{:?}", info))
}

/// One line per tool: name, then description when present.
pub fn format_tools(tools: &[ToolDescriptor]) -> String {
    if tools.is_empty() {
        return "No tools.".to_string();
    }

    tools
        .iter()
        .map(|tool| match tool.description() {
            Some(desc) => format!("- {}: {}", tool.name(), first_line(desc)),
            None => format!("- {}", tool.name()),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default().trim()
}

/// Spinner shown while waiting on a server. Hidden when `quiet`.
pub fn spinner(message: impl Into<String>, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.into());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}
