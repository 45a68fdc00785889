// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Subprocess transport.
//!
//! Lifecycle: `Unopened → Launching → Initializing → Ready → Closed`.
//! `Closed` is terminal and reachable from every state. The child process is
//! owned by a supervisor task that reports unexpected exits and, on shutdown,
//! gives the server a grace period to exit after its stdin closes before
//! killing it. The process and both streams are always released together.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use super::{FailurePolicy, Transport};
use crate::mcp::error::McpError;
use crate::mcp::session::ProtocolSession;
use crate::mcp::types::{CloseReason, ServerInfo, SessionState, ToolDescriptor};
use crate::registry::Protocol;

/// How long to wait for an exit report after the server's stdout closes.
const EXIT_REPORT_WAIT: Duration = Duration::from_millis(500);

/// Launch parameters for a stdio server.
#[derive(Debug, Clone, PartialEq)]
pub struct StdioParams {
    /// Launcher command; whitespace separates the executable from leading arguments.
    pub command: String,

    /// Server program, passed as the final argument.
    pub program: String,

    /// Extra environment variables.
    pub env: BTreeMap<String, String>,

    /// Working directory.
    pub cwd: Option<PathBuf>,
}

impl StdioParams {
    /// Create launch parameters. Both parts must be non-empty.
    pub fn new(command: impl Into<String>, program: impl Into<String>) -> Result<Self, McpError> {
        let command = command.into();
        let program = program.into();

        if command.trim().is_empty() {
            return Err(McpError::config("Stdio transport requires a 'command'"));
        }
        if program.trim().is_empty() {
            return Err(McpError::config("Stdio transport requires a 'program'"));
        }

        Ok(Self {
            command,
            program,
            env: BTreeMap::new(),
            cwd: None,
        })
    }

    /// Set environment variables.
    pub fn with_env(
        mut self,
        env: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        self.env = env.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    /// Set working directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Executable and full argument list.
    pub fn launch_line(&self) -> (String, Vec<String>) {
        let mut parts = self.command.split_whitespace().map(|s| s.to_string());
        let executable = parts.next().unwrap_or_default();
        let mut args: Vec<String> = parts.collect();
        args.push(self.program.clone());
        (executable, args)
    }

    fn build_command(&self) -> Command {
        let (executable, args) = self.launch_line();
        let mut cmd = Command::new(executable);
        cmd.args(args);

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::null());
        cmd.kill_on_drop(true);
        cmd
    }
}

/// Check that a server script is a Python or JavaScript file.
pub(crate) fn validate_script(script: &Path) -> Result<(), McpError> {
    match script.extension().and_then(|e| e.to_str()) {
        Some("py") | Some("js") => Ok(()),
        _ => Err(McpError::config(format!(
            "Server script must be a .py or .js file: {}",
            script.display()
        ))),
    }
}

/// Timing and auto-open behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdioOptions {
    /// Bound on launch plus initialize.
    pub startup_timeout: Duration,

    /// Bound on each request once ready.
    pub request_timeout: Duration,

    /// Time the server gets to exit after stdin closes before it is killed.
    pub shutdown_grace: Duration,

    /// Whether operations may open the session on demand.
    pub auto_open: bool,
}

impl Default for StdioOptions {
    fn default() -> Self {
        Self {
            startup_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
            shutdown_grace: Duration::from_secs(5),
            auto_open: true,
        }
    }
}

/// Why a guarded operation stopped before completing.
enum Interrupt {
    Cancelled,
    Exited(String),
    TimedOut,
}

/// Supervised child process.
struct Supervised {
    pid: Option<u32>,
    shutdown: CancellationToken,
    exited: watch::Receiver<Option<String>>,
    task: Option<JoinHandle<()>>,
}

impl Supervised {
    fn spawn(server: &str, child: Child, shutdown: CancellationToken, grace: Duration) -> Self {
        let pid = child.id();
        let (exit_tx, exit_rx) = watch::channel(None);
        let task = tokio::spawn(supervise(
            server.to_string(),
            child,
            shutdown.clone(),
            grace,
            exit_tx,
        ));

        Self {
            pid,
            shutdown,
            exited: exit_rx,
            task: Some(task),
        }
    }

    /// Exit status if the process has already exited on its own.
    fn exit_status(&self) -> Option<String> {
        self.exited.borrow().clone()
    }

    /// Stop the process and wait until it has been reaped.
    async fn shutdown(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "process supervisor failed");
            }
        }
    }
}

impl Drop for Supervised {
    fn drop(&mut self) {
        // The detached supervisor still reaps the child.
        self.shutdown.cancel();
    }
}

async fn supervise(
    server: String,
    mut child: Child,
    shutdown: CancellationToken,
    grace: Duration,
    exited: watch::Sender<Option<String>>,
) {
    tokio::select! {
        status = child.wait() => {
            let status = describe_exit(status);
            tracing::warn!(server = %server, %status, "server process exited");
            let _ = exited.send(Some(status));
        }
        _ = shutdown.cancelled() => {
            match tokio::time::timeout(grace, child.wait()).await {
                Ok(status) => {
                    tracing::debug!(server = %server, status = %describe_exit(status), "server process stopped");
                }
                Err(_) => {
                    tracing::warn!(server = %server, grace_ms = grace.as_millis() as u64, "server ignored shutdown, killing");
                    if let Err(e) = child.kill().await {
                        tracing::warn!(server = %server, error = %e, "failed to kill server process");
                    }
                }
            }
        }
    }
}

fn describe_exit(status: std::io::Result<std::process::ExitStatus>) -> String {
    match status {
        Ok(status) => status.to_string(),
        Err(e) => format!("unknown ({})", e),
    }
}

async fn wait_for_exit(mut exited: watch::Receiver<Option<String>>) -> String {
    loop {
        let current = exited.borrow_and_update().clone();
        if let Some(status) = current {
            return status;
        }
        if exited.changed().await.is_err() {
            // Supervisor finished without reporting an exit: it is shutting down.
            return std::future::pending().await;
        }
    }
}

/// Race an operation against cancellation, process exit and a deadline.
async fn guarded<T>(
    op: impl Future<Output = Result<T, McpError>>,
    cancel: CancellationToken,
    exited: watch::Receiver<Option<String>>,
    limit: Duration,
) -> Result<Result<T, McpError>, Interrupt> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupt::Cancelled),
        result = tokio::time::timeout(limit, op) => result.map_err(|_| Interrupt::TimedOut),
        status = wait_for_exit(exited) => Err(Interrupt::Exited(status)),
    }
}

/// Transport over a child process's standard streams.
pub struct StdioTransport {
    server: String,
    params: StdioParams,
    options: StdioOptions,
    session_id: Uuid,
    state: SessionState,
    close_reason: Option<CloseReason>,
    session: Option<ProtocolSession<ChildStdout, ChildStdin>>,
    process: Option<Supervised>,
    init: Option<ServerInfo>,
    cancel: CancellationToken,
}

impl StdioTransport {
    /// Create a transport. Nothing is launched until [`Transport::open`].
    pub fn new(
        server: impl Into<String>,
        params: StdioParams,
        options: StdioOptions,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            server: server.into(),
            params,
            options,
            session_id: Uuid::new_v4(),
            state: SessionState::Unopened,
            close_reason: None,
            session: None,
            process: None,
            init: None,
            cancel,
        }
    }

    /// Launch parameters.
    pub fn params(&self) -> &StdioParams {
        &self.params
    }

    /// OS process id while a process is attached.
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(|p| p.pid)
    }

    /// Why the session closed, once it has.
    pub fn close_reason(&self) -> Option<&CloseReason> {
        self.close_reason.as_ref()
    }

    fn closed_error(&self) -> McpError {
        match &self.close_reason {
            Some(CloseReason::Terminated(status)) => McpError::ProcessTerminated {
                server: self.server.clone(),
                status: status.clone(),
            },
            _ => McpError::NotConnected(self.server.clone()),
        }
    }

    fn exit_receiver(&self) -> watch::Receiver<Option<String>> {
        match &self.process {
            Some(process) => process.exited.clone(),
            // No process: a receiver whose sender is gone never reports an exit.
            None => watch::channel(None).1,
        }
    }

    async fn launch_and_initialize(&mut self) -> Result<ServerInfo, McpError> {
        self.state = SessionState::Launching;
        let (executable, args) = self.params.launch_line();
        tracing::debug!(
            server = %self.server,
            session_id = %self.session_id,
            %executable,
            ?args,
            "launching server"
        );

        let mut child = self.params.build_command().spawn().map_err(|e| {
            McpError::connection(&self.server, format!("failed to launch '{}': {}", executable, e))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::connection(&self.server, "Failed to get stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::connection(&self.server, "Failed to get stdout"))?;

        self.process = Some(Supervised::spawn(
            &self.server,
            child,
            self.cancel.child_token(),
            self.options.shutdown_grace,
        ));

        self.state = SessionState::Initializing;
        let cancel = self.cancel.clone();
        let exited = self.exit_receiver();
        let session = self
            .session
            .insert(ProtocolSession::new(self.server.clone(), stdout, stdin));

        match guarded(session.initialize(), cancel, exited, self.options.startup_timeout).await {
            Ok(result) => result,
            Err(Interrupt::Cancelled) => Err(McpError::Cancelled(self.server.clone())),
            Err(Interrupt::Exited(status)) => Err(McpError::ProcessTerminated {
                server: self.server.clone(),
                status,
            }),
            Err(Interrupt::TimedOut) => Err(McpError::ConnectionTimeout {
                server: self.server.clone(),
                timeout: self.options.startup_timeout,
            }),
        }
    }

    /// Bring the session to `Ready`, opening it if allowed.
    async fn ensure_ready(&mut self) -> Result<(), McpError> {
        if self.cancel.is_cancelled() {
            self.teardown(CloseReason::Cancelled).await;
        }

        if self.state == SessionState::Ready {
            let status = self.process.as_ref().and_then(|p| p.exit_status());
            if let Some(status) = status {
                self.teardown(CloseReason::Terminated(status)).await;
            }
        }

        match self.state {
            SessionState::Ready => Ok(()),
            SessionState::Unopened if self.options.auto_open => self.open().await,
            SessionState::Unopened => Err(McpError::NotConnected(self.server.clone())),
            SessionState::Closed => Err(self.closed_error()),
            SessionState::Launching | SessionState::Initializing => {
                // An earlier open was abandoned mid-flight.
                self.teardown(CloseReason::Broken).await;
                Err(self.closed_error())
            }
        }
    }

    /// Turn a stream failure into a termination report when the process is gone.
    async fn reconcile(&mut self, err: McpError) -> McpError {
        if !matches!(err, McpError::Connection { .. }) {
            return err;
        }

        let exited = self.exit_receiver();
        match tokio::time::timeout(EXIT_REPORT_WAIT, wait_for_exit(exited)).await {
            Ok(status) => {
                self.teardown(CloseReason::Terminated(status.clone())).await;
                McpError::ProcessTerminated {
                    server: self.server.clone(),
                    status,
                }
            }
            Err(_) => {
                self.teardown(CloseReason::Broken).await;
                err
            }
        }
    }

    /// Release the process and both streams together. Idempotent.
    async fn teardown(&mut self, reason: CloseReason) {
        if self.state == SessionState::Closed {
            return;
        }

        let previous = self.state;

        // Dropping the session closes stdin, which asks the server to exit.
        self.session = None;
        if let Some(mut process) = self.process.take() {
            process.shutdown().await;
        }
        self.init = None;
        self.state = SessionState::Closed;

        tracing::info!(
            server = %self.server,
            session_id = %self.session_id,
            from = %previous,
            reason = ?reason,
            "session closed"
        );
        self.close_reason = Some(reason);
    }
}

#[async_trait]
impl Transport for StdioTransport {
    fn protocol(&self) -> Protocol {
        Protocol::Stdio
    }

    fn state(&self) -> SessionState {
        self.state
    }

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Propagate
    }

    fn use_script(&mut self, script: &Path) -> Result<(), McpError> {
        validate_script(script)?;
        if self.state != SessionState::Unopened {
            return Err(McpError::config(format!(
                "Cannot change the server program of a {} session",
                self.state
            )));
        }
        self.params.program = script.display().to_string();
        Ok(())
    }

    async fn open(&mut self) -> Result<(), McpError> {
        if self.cancel.is_cancelled() {
            self.teardown(CloseReason::Cancelled).await;
        }

        match self.state {
            SessionState::Ready => return Ok(()),
            SessionState::Closed => return Err(self.closed_error()),
            SessionState::Launching | SessionState::Initializing => {
                self.teardown(CloseReason::Broken).await;
                return Err(self.closed_error());
            }
            SessionState::Unopened => {}
        }

        let span = tracing::info_span!("stdio_session", server = %self.server, session_id = %self.session_id);
        match self.launch_and_initialize().instrument(span).await {
            Ok(info) => {
                tracing::info!(
                    server = %self.server,
                    session_id = %self.session_id,
                    pid = ?self.pid(),
                    remote = info.name().unwrap_or("unknown"),
                    "session ready"
                );
                self.init = Some(info);
                self.state = SessionState::Ready;
                Ok(())
            }
            Err(e) => {
                tracing::error!(server = %self.server, session_id = %self.session_id, error = %e, "failed to open session");
                let reason = if matches!(e, McpError::Cancelled(_)) {
                    CloseReason::Cancelled
                } else {
                    CloseReason::Failed
                };
                self.teardown(reason).await;
                Err(e)
            }
        }
    }

    async fn server_info(&mut self) -> Result<ServerInfo, McpError> {
        self.ensure_ready().await?;
        self.init
            .clone()
            .ok_or_else(|| McpError::NotConnected(self.server.clone()))
    }

    async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>, McpError> {
        self.ensure_ready().await?;

        let cancel = self.cancel.clone();
        let exited = self.exit_receiver();
        let limit = self.options.request_timeout;
        let session = match self.session.as_mut() {
            Some(session) => session,
            None => return Err(McpError::NotConnected(self.server.clone())),
        };

        match guarded(session.list_tools(), cancel, exited, limit).await {
            Ok(Ok(tools)) => {
                tracing::debug!(server = %self.server, count = tools.len(), "listed tools");
                Ok(tools)
            }
            Ok(Err(e)) => Err(self.reconcile(e).await),
            Err(Interrupt::Cancelled) => {
                self.teardown(CloseReason::Cancelled).await;
                Err(McpError::Cancelled(self.server.clone()))
            }
            Err(Interrupt::Exited(status)) => {
                self.teardown(CloseReason::Terminated(status.clone())).await;
                Err(McpError::ProcessTerminated {
                    server: self.server.clone(),
                    status,
                })
            }
            Err(Interrupt::TimedOut) => {
                self.teardown(CloseReason::Broken).await;
                Err(McpError::connection(
                    &self.server,
                    format!("tools/list timed out after {:?}", limit),
                ))
            }
        }
    }

    async fn close(&mut self) {
        self.teardown(CloseReason::Cleanup).await;
    }
}
