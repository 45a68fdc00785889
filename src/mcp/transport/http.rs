// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Stateless HTTP transport.
//!
//! Every operation is an independent `GET {base}/<endpoint>`; the only state
//! kept is the normalized base URL and a pooled `reqwest::Client`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::{FailurePolicy, Transport};
use crate::mcp::error::McpError;
use crate::mcp::types::{json_kind, parse_tools, ServerInfo, SessionState, ToolDescriptor};
use crate::registry::Protocol;

/// Endpoint returning server metadata.
pub const SERVER_INFO_PATH: &str = "server_info";

/// Endpoint returning `{"tools": [...]}`.
pub const LIST_TOOLS_PATH: &str = "list_tools";

/// Validate an HTTP base URL and strip trailing separators.
pub fn normalize_url(url: &str) -> Result<String, McpError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(McpError::config("HTTP transport requires a server URL"));
    }

    let parsed = reqwest::Url::parse(trimmed)
        .map_err(|e| McpError::config(format!("Invalid server URL '{}': {}", trimmed, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(McpError::config(format!(
            "Server URL must use http or https, got '{}'",
            parsed.scheme()
        )));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

/// HTTP request/response transport.
pub struct HttpTransport {
    server: String,
    base_url: String,
    timeout: Duration,
    client: Option<Client>,
    state: SessionState,
    cancel: CancellationToken,
}

impl HttpTransport {
    /// Create a transport. Validates the URL; performs no I/O.
    pub fn new(
        server: impl Into<String>,
        url: &str,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Result<Self, McpError> {
        Ok(Self {
            server: server.into(),
            base_url: normalize_url(url)?,
            timeout,
            client: None,
            state: SessionState::Unopened,
            cancel,
        })
    }

    /// Normalized base URL (no trailing separator).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn ensure_client(&mut self) -> Result<Client, McpError> {
        if self.cancel.is_cancelled() {
            self.release();
        }
        if self.state == SessionState::Closed {
            return Err(McpError::NotConnected(self.server.clone()));
        }

        if let Some(client) = &self.client {
            return Ok(client.clone());
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| McpError::connection(&self.server, format!("failed to build HTTP client: {}", e)))?;
        self.client = Some(client.clone());
        self.state = SessionState::Ready;
        Ok(client)
    }

    async fn get_json(&mut self, path: &str) -> Result<Value, McpError> {
        let client = self.ensure_client()?;
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!(server = %self.server, %url, "GET");

        let server = self.server.clone();
        let request = async {
            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|e| McpError::connection(&server, e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(McpError::connection(
                    &server,
                    format!("HTTP {} from {}", status.as_u16(), url),
                ));
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| McpError::protocol(format!("unparseable body from {}: {}", url, e)))
        };

        tokio::select! {
            _ = self.cancel.cancelled() => {
                self.release();
                Err(McpError::Cancelled(self.server.clone()))
            }
            result = request => result,
        }
    }

    fn release(&mut self) {
        self.client = None;
        self.state = SessionState::Closed;
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn protocol(&self) -> Protocol {
        Protocol::Http
    }

    fn state(&self) -> SessionState {
        self.state
    }

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Degrade
    }

    async fn open(&mut self) -> Result<(), McpError> {
        self.ensure_client().map(|_| ())
    }

    async fn server_info(&mut self) -> Result<ServerInfo, McpError> {
        let body = self.get_json(SERVER_INFO_PATH).await?;
        ServerInfo::from_value(body)
    }

    async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>, McpError> {
        let body = self.get_json(LIST_TOOLS_PATH).await?;
        let mut object = match body {
            Value::Object(map) => map,
            other => {
                return Err(McpError::protocol(format!(
                    "expected list_tools object, got {}",
                    json_kind(&other)
                )))
            }
        };

        match object.remove("tools") {
            Some(tools) => parse_tools(tools),
            None => Ok(Vec::new()),
        }
    }

    async fn close(&mut self) {
        if self.state != SessionState::Closed {
            tracing::debug!(server = %self.server, "releasing HTTP transport");
        }
        self.release();
    }
}
