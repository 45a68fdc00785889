// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! MCP client façade.
//!
//! One interface over both transports. Construction validates parameters and
//! performs no I/O; the transport decides when to connect. Failures are
//! settled according to the transport's [`FailurePolicy`]: degraded results
//! for HTTP, propagated errors (after tearing down) for stdio.

use std::path::Path;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use super::error::McpError;
use super::transport::{FailurePolicy, HttpTransport, StdioOptions, StdioParams, StdioTransport, Transport};
use super::types::{ServerInfo, SessionState, ToolDescriptor};
use crate::registry::{Protocol, ServerDescriptor};

#[cfg(feature = "telemetry")]
use crate::telemetry::metrics;

/// Timeouts and open behavior for clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Bound on launching a stdio server and completing initialize.
    pub startup_timeout: Duration,

    /// Bound on each stdio request once ready.
    pub request_timeout: Duration,

    /// Grace period between closing a server's stdin and killing it.
    pub shutdown_grace: Duration,

    /// Total timeout for each HTTP request.
    pub http_timeout: Duration,

    /// Whether stdio operations may open the session on demand.
    pub auto_open: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            startup_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
            shutdown_grace: Duration::from_secs(5),
            http_timeout: Duration::from_secs(30),
            auto_open: true,
        }
    }
}

impl ClientOptions {
    fn stdio_options(&self) -> StdioOptions {
        StdioOptions {
            startup_timeout: self.startup_timeout,
            request_timeout: self.request_timeout,
            shutdown_grace: self.shutdown_grace,
            auto_open: self.auto_open,
        }
    }
}

/// Aborts a pending client operation from another task.
///
/// Cancelling tears the session down exactly like [`McpClient::cleanup`];
/// the client cannot be reused afterwards.
#[derive(Debug, Clone)]
pub struct CancelHandle(CancellationToken);

impl CancelHandle {
    /// Cancel pending and future operations.
    pub fn cancel(&self) {
        self.0.cancel();
    }

    /// Whether cancel has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }
}

/// Client for a single MCP server.
pub struct McpClient {
    name: String,
    transport: Box<dyn Transport>,
    cancel: CancellationToken,
    last_error: Option<McpError>,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl McpClient {
    /// Build a client from loose parameters.
    ///
    /// HTTP requires `server_url` and forbids `command`/`program`; stdio
    /// requires both `command` and `program` and forbids `server_url`.
    /// Empty strings count as missing.
    pub fn from_parts(
        protocol: Protocol,
        server_url: Option<&str>,
        command: Option<&str>,
        program: Option<&str>,
        options: &ClientOptions,
    ) -> Result<Self, McpError> {
        Self::build(None, protocol, server_url, command, program, options)
    }

    /// HTTP client with default options.
    pub fn http(url: &str) -> Result<Self, McpError> {
        Self::from_parts(Protocol::Http, Some(url), None, None, &ClientOptions::default())
    }

    /// Stdio client with default options.
    pub fn stdio(command: &str, program: &str) -> Result<Self, McpError> {
        Self::from_parts(
            Protocol::Stdio,
            None,
            Some(command),
            Some(program),
            &ClientOptions::default(),
        )
    }

    /// Stdio client from full launch parameters (environment, working directory).
    pub fn stdio_with_params(name: impl Into<String>, params: StdioParams, options: &ClientOptions) -> Self {
        let name = name.into();
        let cancel = CancellationToken::new();
        let transport = StdioTransport::new(&name, params, options.stdio_options(), cancel.clone());
        Self {
            name,
            transport: Box::new(transport),
            cancel,
            last_error: None,
        }
    }

    /// Build a client for a registered server.
    pub fn from_descriptor(descriptor: &ServerDescriptor, options: &ClientOptions) -> Result<Self, McpError> {
        descriptor
            .validate()
            .map_err(|e| McpError::config(e.to_string()))?;

        let record = &descriptor.record;
        Self::build(
            Some(descriptor.name.clone()),
            record.protocol,
            record.url.as_deref(),
            record.command.as_deref(),
            record.program.as_deref(),
            options,
        )
    }

    /// Wrap an existing transport.
    ///
    /// `cancel` must be the token the transport watches; the client's
    /// [`CancelHandle`] cancels it.
    pub fn with_transport(name: impl Into<String>, transport: Box<dyn Transport>, cancel: CancellationToken) -> Self {
        Self {
            name: name.into(),
            transport,
            cancel,
            last_error: None,
        }
    }

    fn build(
        name: Option<String>,
        protocol: Protocol,
        server_url: Option<&str>,
        command: Option<&str>,
        program: Option<&str>,
        options: &ClientOptions,
    ) -> Result<Self, McpError> {
        let (server_url, command, program) = (present(server_url), present(command), present(program));
        let cancel = CancellationToken::new();

        let (name, transport): (String, Box<dyn Transport>) = match protocol {
            Protocol::Http => {
                let url = server_url.ok_or_else(|| McpError::config("HTTP protocol requires a server URL"))?;
                if command.is_some() || program.is_some() {
                    return Err(McpError::config(
                        "HTTP protocol does not accept 'command' or 'program'",
                    ));
                }

                let name = name.unwrap_or_else(|| url.to_string());
                let transport = HttpTransport::new(&name, url, options.http_timeout, cancel.clone())?;
                (name, Box::new(transport))
            }
            Protocol::Stdio => {
                if server_url.is_some() {
                    return Err(McpError::config("Stdio protocol does not accept a server URL"));
                }
                let (command, program) = match (command, program) {
                    (Some(command), Some(program)) => (command, program),
                    _ => {
                        return Err(McpError::config(
                            "Stdio protocol requires both 'command' and 'program'",
                        ))
                    }
                };

                let params = StdioParams::new(command, program)?;
                let name = name.unwrap_or_else(|| program.to_string());
                let transport = StdioTransport::new(&name, params, options.stdio_options(), cancel.clone());
                (name, Box::new(transport))
            }
        };

        tracing::debug!(server = %name, %protocol, "client created");
        Ok(Self {
            name,
            transport,
            cancel,
            last_error: None,
        })
    }

    /// Server name used in logs and messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Transport protocol.
    pub fn protocol(&self) -> Protocol {
        self.transport.protocol()
    }

    /// Session state.
    pub fn state(&self) -> SessionState {
        self.transport.state()
    }

    /// Most recent error, including degraded HTTP failures.
    pub fn last_error(&self) -> Option<&McpError> {
        self.last_error.as_ref()
    }

    /// Take and clear the most recent error.
    pub fn take_last_error(&mut self) -> Option<McpError> {
        self.last_error.take()
    }

    /// Handle that cancels pending operations from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(self.cancel.clone())
    }

    /// Open the session and return server metadata.
    ///
    /// For stdio this launches the server and runs the handshake; `script`
    /// (a `.py` or `.js` path) replaces the configured program. HTTP ignores
    /// `script` and fetches metadata on demand.
    pub async fn connect(&mut self, script: Option<&Path>) -> Result<ServerInfo, McpError> {
        let start = Instant::now();
        tracing::info!(server = %self.name, protocol = %self.protocol(), "connecting");

        let result = self.open_and_describe(script).await;
        let success = result.is_ok();
        let result = self.settle("connect", result, true).await;
        self.record("mcp.client.connect", start, success);
        result
    }

    async fn open_and_describe(&mut self, script: Option<&Path>) -> Result<ServerInfo, McpError> {
        if let Some(script) = script {
            if self.protocol() == Protocol::Http {
                tracing::debug!(server = %self.name, script = %script.display(), "HTTP ignores server script");
            } else {
                self.transport.use_script(script)?;
            }
        }

        self.transport.open().await?;
        self.transport.server_info().await
    }

    /// Server metadata. Opens a stdio session if needed.
    pub async fn get_server_info(&mut self) -> Result<ServerInfo, McpError> {
        let start = Instant::now();
        let result = self.transport.server_info().await;
        let success = result.is_ok();
        let result = self.settle("server_info", result, false).await;
        self.record("mcp.client.server_info", start, success);
        result
    }

    /// Tools exposed by the server. Opens a stdio session if needed and
    /// reuses it afterwards.
    pub async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>, McpError> {
        let start = Instant::now();
        let result = self.transport.list_tools().await;
        let success = result.is_ok();
        let result = self.settle("list_tools", result, false).await;
        self.record("mcp.client.list_tools", start, success);
        result
    }

    /// Release every resource held by the client. Idempotent; safe in any state.
    pub async fn cleanup(&mut self) {
        let start = Instant::now();
        let before = self.state();
        self.transport.close().await;
        if before != SessionState::Closed {
            tracing::info!(server = %self.name, from = %before, "client cleaned up");
        }
        self.record("mcp.client.cleanup", start, true);
    }

    /// Apply the transport's failure policy to an operation result.
    ///
    /// `opening` marks results of the launch/handshake path, where any
    /// failure other than bad configuration tears the session down.
    async fn settle<T: Default>(
        &mut self,
        op: &str,
        result: Result<T, McpError>,
        opening: bool,
    ) -> Result<T, McpError> {
        let err = match result {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        self.last_error = Some(err.clone());

        match self.transport.failure_policy() {
            FailurePolicy::Degrade => {
                tracing::warn!(server = %self.name, op, category = err.category(), error = %err, "degraded result");
                Ok(T::default())
            }
            FailurePolicy::Propagate => {
                let fatal = err.is_connection_error()
                    || matches!(err, McpError::Cancelled(_))
                    || (opening && !matches!(err, McpError::InvalidConfiguration(_)));
                if fatal {
                    tracing::error!(server = %self.name, op, category = err.category(), error = %err, "operation failed");
                    self.transport.close().await;
                } else {
                    tracing::warn!(server = %self.name, op, category = err.category(), error = %err, "operation failed");
                }
                Err(err)
            }
        }
    }

    /// Degraded results are recorded as failures.
    #[cfg(feature = "telemetry")]
    fn record(&self, name: &str, start: Instant, success: bool) {
        metrics::record_operation(name, start.elapsed(), success);
    }

    #[cfg(not(feature = "telemetry"))]
    fn record(&self, _name: &str, _start: Instant, _success: bool) {}
}

impl std::fmt::Debug for McpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpClient")
            .field("name", &self.name)
            .field("protocol", &self.protocol())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::transport::MockTransport;
    use serde_json::json;

    fn mock(protocol: Protocol, policy: FailurePolicy) -> MockTransport {
        let mut transport = MockTransport::new();
        transport.expect_protocol().return_const(protocol);
        transport.expect_failure_policy().return_const(policy);
        transport.expect_state().return_const(SessionState::Ready);
        transport
    }

    fn tool(name: &str) -> ToolDescriptor {
        ToolDescriptor::from_value(json!({ "name": name })).unwrap()
    }

    #[test]
    fn test_from_parts_rejects_wrong_combinations() {
        let opts = ClientOptions::default();
        let cases = [
            (Protocol::Http, None, None, None),
            (Protocol::Http, Some(""), None, None),
            (Protocol::Http, Some("http://localhost:8000"), Some("uv run"), None),
            (Protocol::Stdio, None, None, None),
            (Protocol::Stdio, None, Some("uv run"), None),
            (Protocol::Stdio, None, None, Some("/srv/server.py")),
            (Protocol::Stdio, Some("http://localhost:8000"), Some("uv run"), Some("/srv/server.py")),
        ];

        for (protocol, url, command, program) in cases {
            let err = McpClient::from_parts(protocol, url, command, program, &opts).unwrap_err();
            assert!(
                matches!(err, McpError::InvalidConfiguration(_)),
                "{protocol} {url:?} {command:?} {program:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_construction_performs_no_io() {
        let client = McpClient::http("http://127.0.0.1:1/").unwrap();
        assert_eq!(client.protocol(), Protocol::Http);
        assert_eq!(client.state(), SessionState::Unopened);
        assert_eq!(client.name(), "http://127.0.0.1:1/");

        let client = McpClient::stdio("definitely-not-a-real-binary-4f1c", "/srv/server.py").unwrap();
        assert_eq!(client.protocol(), Protocol::Stdio);
        assert_eq!(client.state(), SessionState::Unopened);
        assert_eq!(client.name(), "/srv/server.py");
    }

    #[test]
    fn test_from_descriptor_uses_registered_name() {
        let descriptor = ServerDescriptor::stdio("local", "run", "/abs/path/server");
        let client = McpClient::from_descriptor(&descriptor, &ClientOptions::default()).unwrap();
        assert_eq!(client.name(), "local");
        assert_eq!(client.protocol(), Protocol::Stdio);

        let broken = ServerDescriptor::http("remote", "");
        let err = McpClient::from_descriptor(&broken, &ClientOptions::default()).unwrap_err();
        assert!(matches!(err, McpError::InvalidConfiguration(_)));
    }

    #[tokio::test]
    async fn test_degrade_policy_returns_empty_and_records_error() {
        let mut transport = mock(Protocol::Http, FailurePolicy::Degrade);
        transport
            .expect_list_tools()
            .times(1)
            .returning(|| Err(McpError::connection("remote", "HTTP 500 from http://x/list_tools")));
        transport.expect_close().times(0);

        let mut client = McpClient::with_transport("remote", Box::new(transport), CancellationToken::new());
        let tools = client.list_tools().await.unwrap();
        assert!(tools.is_empty());

        let err = client.take_last_error().unwrap();
        assert!(err.is_connection_error());
        assert!(client.last_error().is_none());
    }

    #[tokio::test]
    async fn test_propagate_policy_tears_down_on_connection_error() {
        let mut transport = mock(Protocol::Stdio, FailurePolicy::Propagate);
        transport
            .expect_open()
            .times(1)
            .returning(|| Err(McpError::connection("local", "failed to launch 'run'")));
        transport.expect_server_info().times(0);
        transport.expect_close().times(1).return_const(());

        let mut client = McpClient::with_transport("local", Box::new(transport), CancellationToken::new());
        let err = client.connect(None).await.unwrap_err();
        assert!(err.is_connection_error());
        assert_eq!(client.last_error(), Some(&err));
    }

    #[tokio::test]
    async fn test_rpc_error_keeps_session() {
        let mut transport = mock(Protocol::Stdio, FailurePolicy::Propagate);
        transport
            .expect_list_tools()
            .times(1)
            .returning(|| Err(McpError::rpc(-32601, "Method not found")));
        transport.expect_close().times(0);

        let mut client = McpClient::with_transport("local", Box::new(transport), CancellationToken::new());
        let err = client.list_tools().await.unwrap_err();
        assert_eq!(err, McpError::rpc(-32601, "Method not found"));
    }

    #[tokio::test]
    async fn test_connect_passes_script_and_returns_info() {
        let mut transport = mock(Protocol::Stdio, FailurePolicy::Propagate);
        transport
            .expect_use_script()
            .times(1)
            .returning(|_| Ok(()));
        transport.expect_open().times(1).returning(|| Ok(()));
        transport.expect_server_info().times(1).returning(|| {
            Ok(ServerInfo::from_value(json!({"serverInfo": {"name": "echo"}})).unwrap())
        });
        transport
            .expect_list_tools()
            .times(2)
            .returning(|| Ok(vec![tool("add"), tool("echo")]));

        let mut client = McpClient::with_transport("local", Box::new(transport), CancellationToken::new());
        let info = client.connect(Some(Path::new("/srv/other.py"))).await.unwrap();
        assert_eq!(info.name(), Some("echo"));

        assert_eq!(client.list_tools().await.unwrap().len(), 2);
        assert_eq!(client.list_tools().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_bad_script_is_configuration_error() {
        let mut client = McpClient::stdio("definitely-not-a-real-binary-4f1c", "/srv/server.py").unwrap();
        let err = client.connect(Some(Path::new("/srv/server.sh"))).await.unwrap_err();
        assert!(matches!(err, McpError::InvalidConfiguration(_)));
        assert_eq!(client.state(), SessionState::Unopened);
    }

    #[tokio::test]
    async fn test_cleanup_is_idempotent() {
        let mut transport = mock(Protocol::Stdio, FailurePolicy::Propagate);
        transport.expect_close().times(3).return_const(());

        let mut client = McpClient::with_transport("local", Box::new(transport), CancellationToken::new());
        client.cleanup().await;
        client.cleanup().await;
        client.cleanup().await;
    }

    #[tokio::test]
    async fn test_cleanup_without_session_closes_real_transports() {
        let mut client = McpClient::stdio("uv run", "/srv/server.py").unwrap();
        client.cleanup().await;
        client.cleanup().await;
        assert_eq!(client.state(), SessionState::Closed);

        let err = client.list_tools().await.unwrap_err();
        assert!(matches!(err, McpError::NotConnected(_)));

        let mut client = McpClient::http("http://127.0.0.1:1").unwrap();
        client.cleanup().await;
        assert_eq!(client.state(), SessionState::Closed);
    }

    #[test]
    fn test_cancel_handle_reaches_wrapped_transport() {
        let token = CancellationToken::new();
        let client = McpClient::with_transport(
            "local",
            Box::new(mock(Protocol::Stdio, FailurePolicy::Propagate)),
            token.clone(),
        );

        client.cancel_handle().cancel();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_handle_closes_session() {
        let mut client = McpClient::stdio("uv run", "/srv/server.py").unwrap();
        let handle = client.cancel_handle();
        assert!(!handle.is_cancelled());

        handle.cancel();
        let err = client.list_tools().await.unwrap_err();
        assert!(matches!(err, McpError::NotConnected(_)));
        assert_eq!(client.state(), SessionState::Closed);
    }
}
