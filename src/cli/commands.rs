// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! One-shot command handlers.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use colored::Colorize;

use super::{interruptible, render};
use crate::config::ResolvedConfig;
use crate::mcp::{McpClient, ToolExport};
use crate::registry::{Protocol, RegistryStore, ServerDescriptor};

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// How the `connect` command picks its server.
#[derive(Debug, Clone, Default)]
pub struct ConnectTarget {
    /// Registered server name.
    pub name: Option<String>,
    pub url: Option<String>,
    pub command: Option<String>,
    pub program: Option<String>,
}

impl ConnectTarget {
    /// Build a client for this target without opening it.
    pub fn client(&self, config: &ResolvedConfig) -> anyhow::Result<McpClient> {
        let options = config.client_options();

        if let Some(name) = &self.name {
            if self.url.is_some() || self.command.is_some() || self.program.is_some() {
                bail!("Give either a registered server name or explicit connection flags, not both");
            }
            let descriptor = load_descriptor(&config.registry_path, name)?;
            return Ok(McpClient::from_descriptor(&descriptor, &options)?);
        }

        let protocol = match (&self.url, &self.command, &self.program) {
            (None, None, None) => bail!("Specify a server name, --url, or --command with --program"),
            (Some(_), _, _) => Protocol::Http,
            _ => Protocol::Stdio,
        };

        Ok(McpClient::from_parts(
            protocol,
            self.url.as_deref(),
            self.command.as_deref(),
            self.program.as_deref(),
            &options,
        )?)
    }
}

/// Look up one registered server.
pub fn load_descriptor(registry_path: &Path, name: &str) -> anyhow::Result<ServerDescriptor> {
    let registry = RegistryStore::new(registry_path).try_load()?;
    registry
        .descriptor(name)
        .ok_or_else(|| crate::error::RegistryError::ServerNotFound(name.to_string()).into())
}

/// `servers list`
pub fn servers_list(config: &ResolvedConfig, protocol: Option<Protocol>, format: OutputFormat) -> anyhow::Result<()> {
    let loaded = RegistryStore::new(&config.registry_path).load();
    if let Some(err) = &loaded.error {
        render::print_warning("registry", err);
    }

    match format {
        OutputFormat::Json => {
            let value = render::servers_json(&loaded.registry, protocol);
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => println!("{}", render::format_servers(&loaded.registry, protocol)),
    }
    Ok(())
}

/// `servers add`. Replaces any server already registered under the name.
pub fn servers_add(config: &ResolvedConfig, descriptor: ServerDescriptor) -> anyhow::Result<()> {
    let store = RegistryStore::new(&config.registry_path);
    let replaced = store.try_load()?.get(&descriptor.name).is_some();
    let name = descriptor.name.clone();

    store.add(descriptor)?;
    if replaced {
        println!("{} server '{}'", "Replaced".yellow(), name);
    } else {
        println!("{} server '{}'", "Added".green(), name);
    }
    Ok(())
}

/// `servers remove`
pub fn servers_remove(config: &ResolvedConfig, name: &str) -> anyhow::Result<()> {
    RegistryStore::new(&config.registry_path).remove(name)?;
    println!("{} server '{}'", "Removed".green(), name);
    Ok(())
}

/// Options for `connect`.
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Server script replacing the configured stdio program.
    pub script: Option<PathBuf>,

    /// Where to export the tool listing, if anywhere.
    pub export: Option<PathBuf>,

    pub quiet: bool,
}

/// `connect`: show server info and tools, optionally export, always clean up.
pub async fn connect(config: &ResolvedConfig, target: &ConnectTarget, opts: &ConnectOptions) -> anyhow::Result<()> {
    let mut client = target.client(config)?;
    let result = explore_once(&mut client, opts).await;
    client.cleanup().await;
    result
}

async fn explore_once(client: &mut McpClient, opts: &ConnectOptions) -> anyhow::Result<()> {
    let bar = render::spinner(format!("Connecting to {}", client.name()), opts.quiet);
    let info = interruptible(client.cancel_handle(), client.connect(opts.script.as_deref())).await;
    bar.finish_and_clear();
    let info = info.with_context(|| format!("connecting to '{}'", client.name()))?;
    report_degraded(client);

    println!("{} {} ({})", "Server".bold(), client.name(), client.protocol());
    println!("{}", render::format_server_info(&info));

    let bar = render::spinner("Listing tools", opts.quiet);
    let tools = interruptible(client.cancel_handle(), client.list_tools()).await;
    bar.finish_and_clear();
    let tools = tools.with_context(|| format!("listing tools of '{}'", client.name()))?;
    report_degraded(client);

    println!("\n{} ({})", "Tools".bold(), tools.len());
    println!("{}", render::format_tools(&tools));

    if let Some(path) = &opts.export {
        ToolExport::from_tools(&tools).write_to(path)?;
        println!("{} {} tools to {}", "Exported".green(), tools.len(), path.display());
    }
    Ok(())
}

/// Surface an error the client absorbed into an empty result.
pub(crate) fn report_degraded(client: &mut McpClient) {
    if let Some(err) = client.take_last_error() {
        render::print_error(&err);
    }
}
