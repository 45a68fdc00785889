// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Protocol session over a pair of byte streams.
//!
//! Messages are JSON-RPC 2.0 objects, one per line. The session is strictly
//! sequential: one request is written, then lines are read until the response
//! carrying the same id arrives. Anything else seen while waiting (server log
//! lines, notifications, stale responses) is skipped; server-initiated
//! requests get an immediate answer so the server is never left blocked.

use std::collections::HashSet;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use super::error::McpError;
use super::types::{parse_tools, ServerInfo, ToolDescriptor};

/// MCP protocol revision announced during initialize.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Client name announced during initialize.
pub const CLIENT_NAME: &str = "mcp-explorer";

/// JSON-RPC "method not found".
const METHOD_NOT_FOUND: i64 = -32601;

/// Sequential JSON-RPC session over a reader/writer pair.
pub struct ProtocolSession<R, W> {
    server: String,
    reader: BufReader<R>,
    writer: W,
    request_id: u64,
}

impl<R, W> ProtocolSession<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Create a session. Nothing is sent until the first request.
    pub fn new(server: impl Into<String>, reader: R, writer: W) -> Self {
        Self {
            server: server.into(),
            reader: BufReader::new(reader),
            writer,
            request_id: 0,
        }
    }

    /// Get the next request ID.
    fn next_request_id(&mut self) -> u64 {
        self.request_id += 1;
        self.request_id
    }

    /// Run the initialize exchange and announce readiness.
    ///
    /// The whole initialize result is returned as opaque server metadata.
    pub async fn initialize(&mut self) -> Result<ServerInfo, McpError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": CLIENT_NAME,
                "version": crate::VERSION
            }
        });

        let result = self.request("initialize", Some(params)).await?;
        let info = ServerInfo::from_value(result)?;

        self.notify("notifications/initialized", None).await?;
        Ok(info)
    }

    /// List every tool, following pagination cursors.
    pub async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>, McpError> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen = HashSet::new();

        loop {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let result = self.request("tools/list", params).await?;

            let page = result
                .as_object()
                .ok_or_else(|| McpError::protocol("tools/list result is not an object"))?;
            let items = page
                .get("tools")
                .cloned()
                .ok_or_else(|| McpError::protocol("tools/list result is missing 'tools'"))?;
            tools.extend(parse_tools(items)?);

            cursor = page
                .get("nextCursor")
                .and_then(|c| c.as_str())
                .map(|c| c.to_string());
            match &cursor {
                None => break,
                Some(next) if !seen.insert(next.clone()) => {
                    return Err(McpError::protocol(format!(
                        "tools/list repeated cursor '{}'",
                        next
                    )));
                }
                Some(_) => {}
            }
        }

        Ok(tools)
    }

    /// Send a request and wait for its result.
    pub async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        let id = self.next_request_id();

        let mut request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method
        });
        if let Some(params) = params {
            request["params"] = params;
        }

        tracing::trace!(server = %self.server, id, method, "sending request");
        self.send(&request).await?;

        loop {
            let message = self.read_message().await?;

            if let Some(incoming) = message.get("method").and_then(|m| m.as_str()) {
                match message.get("id") {
                    Some(request_id) => {
                        let incoming = incoming.to_string();
                        self.answer_server_request(request_id.clone(), &incoming).await?;
                    }
                    None => tracing::trace!(server = %self.server, method = incoming, "skipping notification"),
                }
                continue;
            }

            if message.get("id").and_then(|v| v.as_u64()) != Some(id) {
                tracing::debug!(server = %self.server, expected = id, "skipping unrelated response");
                continue;
            }

            if let Some(error) = message.get("error") {
                let code = error.get("code").and_then(|v| v.as_i64()).unwrap_or(-1);
                let message = error
                    .get("message")
                    .and_then(|v| v.as_str())
                    .unwrap_or("Unknown error");
                return Err(McpError::rpc(code, message));
            }

            return message.get("result").cloned().ok_or_else(|| {
                McpError::protocol(format!("Missing result in {} response", method))
            });
        }
    }

    /// Send a notification (no response expected).
    pub async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<(), McpError> {
        let mut notification = json!({
            "jsonrpc": "2.0",
            "method": method
        });
        if let Some(params) = params {
            notification["params"] = params;
        }
        self.send(&notification).await
    }

    async fn answer_server_request(&mut self, id: Value, method: &str) -> Result<(), McpError> {
        let reply = if method == "ping" {
            json!({ "jsonrpc": "2.0", "id": id, "result": {} })
        } else {
            tracing::debug!(server = %self.server, method, "rejecting server request");
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": METHOD_NOT_FOUND, "message": format!("Method not found: {}", method) }
            })
        };
        self.send(&reply).await
    }

    async fn send(&mut self, message: &Value) -> Result<(), McpError> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');

        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| McpError::connection(&self.server, format!("failed to write request: {}", e)))?;
        self.writer
            .flush()
            .await
            .map_err(|e| McpError::connection(&self.server, format!("failed to flush request: {}", e)))
    }

    async fn read_message(&mut self) -> Result<Value, McpError> {
        let mut line = Vec::new();

        loop {
            line.clear();
            let bytes_read = self
                .reader
                .read_until(b'\n', &mut line)
                .await
                .map_err(|e| McpError::connection(&self.server, format!("failed to read response: {}", e)))?;

            if bytes_read == 0 {
                return Err(McpError::connection(
                    &self.server,
                    "server closed its output stream",
                ));
            }

            let trimmed = line.trim_ascii();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_slice::<Value>(trimmed) {
                Ok(value) if value.is_object() => return Ok(value),
                _ => tracing::debug!(
                    server = %self.server,
                    line = %String::from_utf8_lossy(trimmed),
                    "skipping non JSON-RPC output"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, split, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

    type TestSession = ProtocolSession<tokio::io::ReadHalf<DuplexStream>, tokio::io::WriteHalf<DuplexStream>>;

    /// Session wired to an in-memory peer.
    fn session_pair() -> (TestSession, DuplexStream) {
        let (client_side, server_side) = duplex(64 * 1024);
        let (read, write) = split(client_side);
        (ProtocolSession::new("test", read, write), server_side)
    }

    async fn read_json(reader: &mut BufReader<tokio::io::ReadHalf<DuplexStream>>) -> Value {
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        serde_json::from_str(&line).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_sends_handshake_and_notification() {
        let (mut session, server) = session_pair();
        let (server_read, mut server_write) = split(server);
        let mut server_read = BufReader::new(server_read);

        let peer = tokio::spawn(async move {
            let request = read_json(&mut server_read).await;
            assert_eq!(request["method"], "initialize");
            assert_eq!(request["params"]["protocolVersion"], PROTOCOL_VERSION);
            assert_eq!(request["params"]["clientInfo"]["name"], CLIENT_NAME);

            let response = json!({
                "jsonrpc": "2.0",
                "id": request["id"],
                "result": {"protocolVersion": PROTOCOL_VERSION, "serverInfo": {"name": "peer", "version": "1"}}
            });
            server_write
                .write_all(format!("{}\n", response).as_bytes())
                .await
                .unwrap();

            let notification = read_json(&mut server_read).await;
            assert_eq!(notification["method"], "notifications/initialized");
            assert!(notification.get("id").is_none());
        });

        let info = session.initialize().await.unwrap();
        assert_eq!(info.name(), Some("peer"));
        peer.await.unwrap();
    }

    #[tokio::test]
    async fn test_request_skips_noise_and_answers_ping() {
        let (mut session, server) = session_pair();
        let (server_read, mut server_write) = split(server);
        let mut server_read = BufReader::new(server_read);

        let peer = tokio::spawn(async move {
            let request = read_json(&mut server_read).await;
            let id = request["id"].clone();

            let noise = format!(
                "starting up...\n\n{}\n{}\n{}\n",
                json!({"jsonrpc": "2.0", "method": "notifications/message", "params": {}}),
                json!({"jsonrpc": "2.0", "id": 999, "result": {}}),
                json!({"jsonrpc": "2.0", "id": "srv-1", "method": "ping"}),
            );
            server_write.write_all(noise.as_bytes()).await.unwrap();

            let pong = read_json(&mut server_read).await;
            assert_eq!(pong["id"], "srv-1");
            assert_eq!(pong["result"], json!({}));

            let response = json!({"jsonrpc": "2.0", "id": id, "result": {"ok": true}});
            server_write
                .write_all(format!("{}\n", response).as_bytes())
                .await
                .unwrap();
        });

        let result = session.request("custom/method", None).await.unwrap();
        assert_eq!(result, json!({"ok": true}));
        peer.await.unwrap();
    }

    #[tokio::test]
    async fn test_request_skips_undecodable_output() {
        let (mut session, server) = session_pair();
        let (server_read, mut server_write) = split(server);
        let mut server_read = BufReader::new(server_read);

        tokio::spawn(async move {
            let request = read_json(&mut server_read).await;
            server_write.write_all(b"caf\xe9 starting\n").await.unwrap();

            let response = json!({"jsonrpc": "2.0", "id": request["id"], "result": {"ok": true}});
            server_write
                .write_all(format!("{}\n", response).as_bytes())
                .await
                .unwrap();
        });

        let result = session.request("custom/method", None).await.unwrap();
        assert_eq!(result, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_rpc_error_response() {
        let (mut session, server) = session_pair();
        let (server_read, mut server_write) = split(server);
        let mut server_read = BufReader::new(server_read);

        tokio::spawn(async move {
            let request = read_json(&mut server_read).await;
            let response = json!({
                "jsonrpc": "2.0",
                "id": request["id"],
                "error": {"code": -32601, "message": "Method not found"}
            });
            server_write
                .write_all(format!("{}\n", response).as_bytes())
                .await
                .unwrap();
        });

        let err = session.request("tools/list", None).await.unwrap_err();
        assert_eq!(err, McpError::rpc(-32601, "Method not found"));
    }

    #[tokio::test]
    async fn test_list_tools_follows_cursor() {
        let (mut session, server) = session_pair();
        let (server_read, mut server_write) = split(server);
        let mut server_read = BufReader::new(server_read);

        tokio::spawn(async move {
            let first = read_json(&mut server_read).await;
            assert!(first.get("params").is_none());
            let page = json!({
                "jsonrpc": "2.0", "id": first["id"],
                "result": {"tools": [{"name": "a"}], "nextCursor": "page-2"}
            });
            server_write.write_all(format!("{}\n", page).as_bytes()).await.unwrap();

            let second = read_json(&mut server_read).await;
            assert_eq!(second["params"]["cursor"], "page-2");
            let page = json!({
                "jsonrpc": "2.0", "id": second["id"],
                "result": {"tools": [{"name": "b"}]}
            });
            server_write.write_all(format!("{}\n", page).as_bytes()).await.unwrap();
        });

        let tools = session.list_tools().await.unwrap();
        let names: Vec<_> = tools.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_list_tools_rejects_repeated_cursor() {
        let (mut session, server) = session_pair();
        let (server_read, mut server_write) = split(server);
        let mut server_read = BufReader::new(server_read);

        tokio::spawn(async move {
            for _ in 0..2 {
                let request = read_json(&mut server_read).await;
                let page = json!({
                    "jsonrpc": "2.0", "id": request["id"],
                    "result": {"tools": [{"name": "a"}], "nextCursor": "same"}
                });
                server_write.write_all(format!("{}\n", page).as_bytes()).await.unwrap();
            }
        });

        let err = tokio::time::timeout(std::time::Duration::from_secs(5), session.list_tools())
            .await
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, McpError::Protocol(ref message) if message.contains("repeated cursor")), "{err:?}");
    }

    #[tokio::test]
    async fn test_closed_stream_is_connection_error() {
        let (mut session, server) = session_pair();
        drop(server);

        let err = session.request("tools/list", None).await.unwrap_err();
        assert!(err.is_connection_error());
    }
}
