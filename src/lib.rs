// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! MCP explorer - discover what Model Context Protocol servers offer.
//!
//! Register servers by name, connect over HTTP or a local subprocess, inspect
//! server metadata and the tools a server exposes, and export tool listings
//! as JSON.
//!
//! # Architecture
//!
//! - [`registry`] - Durable name → server descriptor store
//! - [`mcp`] - Client façade, transports, protocol session, export
//! - [`config`] - Configuration loading and merging
//! - [`telemetry`] - Tracing setup and operation metrics
//! - [`cli`] - Command handlers and the interactive explorer
//! - [`error`] - Crate-level error types
//!
//! # Example
//!
//! ```rust,ignore
//! use mcp_explorer::{McpClient, RegistryStore};
//!
//! let loaded = RegistryStore::new("mcp_servers.json").load();
//! let descriptor = loaded.registry.descriptor("local").unwrap();
//!
//! let mut client = McpClient::from_descriptor(&descriptor, &Default::default())?;
//! for tool in client.list_tools().await? {
//!     println!("{}", tool.name());
//! }
//! client.cleanup().await;
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod mcp;
pub mod registry;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use error::{ConfigError, RegistryError, Result};
pub use mcp::{
    CancelHandle, ClientOptions, McpClient, McpError, ServerInfo, SessionState, ToolDescriptor,
    ToolExport,
};
pub use registry::{Protocol, Registry, RegistryStore, ServerDescriptor, ServerRecord};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
