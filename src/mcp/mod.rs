// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Model Context Protocol (MCP) client support.
//!
//! One [`McpClient`] talks to one server over one of two transports:
//!
//! ```text
//!              ┌──────────────┐
//!              │  McpClient   │  connect / get_server_info / list_tools / cleanup
//!              └──────┬───────┘
//!          ┌──────────┴──────────┐
//!    ┌─────▼─────┐         ┌─────▼─────┐
//!    │   HTTP    │         │   Stdio   │──▶ child process
//!    │ Transport │         │ Transport │    + ProtocolSession
//!    └───────────┘         └───────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use mcp_explorer::mcp::{McpClient, ToolExport};
//!
//! let mut client = McpClient::stdio("uv run", "/srv/server.py")?;
//! let tools = client.list_tools().await?;
//! ToolExport::from_tools(&tools).write_to("mcp_tools.json".as_ref())?;
//! client.cleanup().await;
//! ```

pub mod client;
pub mod error;
pub mod export;
pub mod session;
pub mod transport;
pub mod types;

pub use client::{CancelHandle, ClientOptions, McpClient};
pub use error::McpError;
pub use export::{ToolExport, DEFAULT_EXPORT_FILE};
pub use transport::{FailurePolicy, HttpTransport, StdioOptions, StdioParams, StdioTransport, Transport};
pub use types::{CloseReason, JsonObject, ServerInfo, SessionState, ToolDescriptor};
