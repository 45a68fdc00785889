// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Transports carrying MCP traffic.
//!
//! Both variants implement [`Transport`], so the client façade never branches
//! on protocol for control flow. The only behavioral difference it observes
//! is [`FailurePolicy`]: HTTP failures degrade to empty results, stdio
//! failures propagate.

mod http;
mod stdio;

use std::path::Path;

use async_trait::async_trait;

use super::error::McpError;
use super::types::{ServerInfo, SessionState, ToolDescriptor};
use crate::registry::Protocol;

pub use http::{normalize_url, HttpTransport};
pub use stdio::{StdioOptions, StdioParams, StdioTransport};

/// How the client treats a failed transport operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Report the error and hand the caller an empty result.
    Degrade,

    /// Tear down and return the error to the caller.
    Propagate,
}

/// One live (or not yet opened) connection to a server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send {
    /// Protocol carried by this transport.
    fn protocol(&self) -> Protocol;

    /// Current lifecycle state.
    fn state(&self) -> SessionState;

    /// Failure handling expected from the client.
    fn failure_policy(&self) -> FailurePolicy;

    /// Replace the launched program with a server script before opening.
    ///
    /// Transports without a launch step ignore this.
    fn use_script(&mut self, _script: &Path) -> Result<(), McpError> {
        Ok(())
    }

    /// Establish the session. Idempotent once ready.
    async fn open(&mut self) -> Result<(), McpError>;

    /// Metadata describing the server.
    async fn server_info(&mut self) -> Result<ServerInfo, McpError>;

    /// Tools exposed by the server.
    async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>, McpError>;

    /// Release every resource. Safe to call repeatedly and from any state.
    async fn close(&mut self);
}
