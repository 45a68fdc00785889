// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Interactive explorer.
//!
//! The explorer holds at most one client at a time and cleans it up before
//! replacing it. Ctrl-C at the prompt is ignored; Ctrl-C while waiting on a
//! server cancels that operation and drops the connection.

use std::path::PathBuf;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use super::commands::report_degraded;
use super::{interruptible, render};
use crate::config::ResolvedConfig;
use crate::mcp::{McpClient, ToolExport};
use crate::registry::RegistryStore;

const HELP: &str = "\
Commands:
  servers         List registered servers
  use <name>      Select a registered server
  url <url>       Select an HTTP server by URL
  info            Show server info
  tools           List tools
  export [file]   Export tools as JSON
  disconnect      Close the current connection
  help            Show this help
  quit            Exit";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Servers,
    Use(String),
    Url(String),
    Info,
    Tools,
    Export(Option<PathBuf>),
    Disconnect,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

impl ReplCommand {
    /// Parse an input line.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match (word.to_lowercase().as_str(), rest) {
            ("", _) => Self::Empty,
            ("servers" | "ls", "") => Self::Servers,
            ("use", "") => Self::Invalid("usage: use <name>".to_string()),
            ("use", name) => Self::Use(name.to_string()),
            ("url", "") => Self::Invalid("usage: url <url>".to_string()),
            ("url", url) => Self::Url(url.to_string()),
            ("info", "") => Self::Info,
            ("tools", "") => Self::Tools,
            ("export", "") => Self::Export(None),
            ("export", path) => Self::Export(Some(PathBuf::from(path))),
            ("disconnect", "") => Self::Disconnect,
            ("help" | "?", _) => Self::Help,
            ("quit" | "exit" | "q", "") => Self::Quit,
            _ => Self::Invalid(format!("unknown command '{}', try 'help'", line)),
        }
    }
}

/// Interactive session state.
pub struct Explorer {
    config: ResolvedConfig,
    store: RegistryStore,
    client: Option<McpClient>,
    quiet: bool,
}

impl Explorer {
    pub fn new(config: ResolvedConfig, quiet: bool) -> Self {
        let store = RegistryStore::new(&config.registry_path);
        Self {
            config,
            store,
            client: None,
            quiet,
        }
    }

    /// Current client, if a server is selected.
    pub fn client(&self) -> Option<&McpClient> {
        self.client.as_ref()
    }

    /// Swap the current client, cleaning up the old one first.
    pub async fn replace_client(&mut self, client: Option<McpClient>) {
        if let Some(mut old) = self.client.take() {
            old.cleanup().await;
        }
        self.client = client;
    }

    /// Run one command. Returns `false` when the explorer should exit.
    pub async fn execute(&mut self, command: ReplCommand) -> anyhow::Result<bool> {
        match command {
            ReplCommand::Empty => {}
            ReplCommand::Help => println!("{}", HELP),
            ReplCommand::Quit => return Ok(false),
            ReplCommand::Invalid(message) => render::print_warning("input", message),
            ReplCommand::Servers => {
                let loaded = self.store.load();
                if let Some(err) = &loaded.error {
                    render::print_warning("registry", err);
                }
                println!("{}", render::format_servers(&loaded.registry, None));
            }
            ReplCommand::Use(name) => {
                let descriptor = super::commands::load_descriptor(self.store.path(), &name)?;
                let client = McpClient::from_descriptor(&descriptor, &self.config.client_options())?;
                self.replace_client(Some(client)).await;
                println!("Selected {} ({})", name.bold(), descriptor.protocol());
            }
            ReplCommand::Url(url) => {
                let client = McpClient::from_parts(
                    crate::registry::Protocol::Http,
                    Some(&url),
                    None,
                    None,
                    &self.config.client_options(),
                )?;
                self.replace_client(Some(client)).await;
                println!("Selected {}", url.bold());
            }
            ReplCommand::Disconnect => {
                if self.client.is_some() {
                    self.replace_client(None).await;
                    println!("Disconnected");
                } else {
                    println!("No server selected");
                }
            }
            ReplCommand::Info => {
                let quiet = self.quiet;
                let Some(client) = self.selected() else { return Ok(true) };
                let bar = render::spinner(format!("Querying {}", client.name()), quiet);
                let info = interruptible(client.cancel_handle(), client.get_server_info()).await;
                bar.finish_and_clear();
                report_degraded(client);
                println!("{}", render::format_server_info(&info?));
            }
            ReplCommand::Tools => self.list_tools(None).await?,
            ReplCommand::Export(path) => {
                let path = path.unwrap_or_else(|| self.config.export_path.clone());
                self.list_tools(Some(path)).await?;
            }
        }
        Ok(true)
    }

    /// List tools of the current server, printing them or exporting them to `export`.
    async fn list_tools(&mut self, export: Option<PathBuf>) -> anyhow::Result<()> {
        let quiet = self.quiet;
        let Some(client) = self.selected() else { return Ok(()) };

        let bar = render::spinner(format!("Listing tools of {}", client.name()), quiet);
        let tools = interruptible(client.cancel_handle(), client.list_tools()).await;
        bar.finish_and_clear();
        report_degraded(client);
        let tools = tools?;

        match export {
            Some(path) => {
                ToolExport::from_tools(&tools).write_to(&path)?;
                println!("{} {} tools to {}", "Exported".green(), tools.len(), path.display());
            }
            None => println!("{}", render::format_tools(&tools)),
        }
        Ok(())
    }

    fn selected(&mut self) -> Option<&mut McpClient> {
        if self.client.is_none() {
            println!("No server selected. Use 'use <name>' or 'url <url>'.");
        }
        self.client.as_mut()
    }

    fn prompt(&self) -> String {
        match &self.client {
            Some(client) => format!("mcp[{}]> ", client.name()),
            None => "mcp> ".to_string(),
        }
    }

    /// Read-eval loop until `quit` or end of input. Always cleans up.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut editor = DefaultEditor::new()?;
        println!("{} (type 'help' for commands)", "MCP explorer".bold());

        let result = loop {
            let prompt = self.prompt();
            let line = tokio::task::block_in_place(|| editor.readline(&prompt));

            match line {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = editor.add_history_entry(line.as_str());
                    }
                    match self.execute(ReplCommand::parse(&line)).await {
                        Ok(true) => {}
                        Ok(false) => break Ok(()),
                        Err(err) => render::print_failure(&err),
                    }
                }
                Err(ReadlineError::Interrupted) => {}
                Err(ReadlineError::Eof) => break Ok(()),
                Err(err) => break Err(err.into()),
            }
        };

        self.replace_client(None).await;
        result
    }
}
