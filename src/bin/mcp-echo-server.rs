// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Minimal stdio MCP server for tests and demos.
//!
//! Usage: `mcp-echo-server [program]`. The optional argument is reported back
//! in the initialize result so callers can see what was launched.
//!
//! Behavior switches (environment):
//! - `MCP_ECHO_LAUNCH_LOG=<file>`: append one line per launch
//! - `MCP_ECHO_EXIT_ON=<method>`: exit with status 3 on receiving that method
//! - `MCP_ECHO_HANG_INIT=1`: never answer initialize
//! - `MCP_ECHO_LINGER=1`: keep running for a minute after stdin closes

use std::io::{self, BufRead, Write};
use std::time::Duration;

use serde_json::{json, Value};

const SERVER_NAME: &str = "mcp-echo-server";

fn tools_page(cursor: Option<&str>) -> Value {
    match cursor {
        None => json!({
            "tools": [{
                "name": "echo",
                "description": "Echo back the input text",
                "inputSchema": {
                    "type": "object",
                    "properties": {"text": {"type": "string"}},
                    "required": ["text"]
                }
            }],
            "nextCursor": "page-2"
        }),
        Some(_) => json!({
            "tools": [{
                "name": "add",
                "description": "Add two numbers",
                "inputSchema": {
                    "type": "object",
                    "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
                    "required": ["a", "b"]
                }
            }]
        }),
    }
}

fn respond(out: &mut impl Write, message: Value) -> io::Result<()> {
    writeln!(out, "{}", message)?;
    out.flush()
}

fn main() -> io::Result<()> {
    let program = std::env::args().nth(1).unwrap_or_default();
    let exit_on = std::env::var("MCP_ECHO_EXIT_ON").ok();
    let hang_init = std::env::var("MCP_ECHO_HANG_INIT").is_ok();
    let linger = std::env::var("MCP_ECHO_LINGER").is_ok();

    if let Ok(log) = std::env::var("MCP_ECHO_LAUNCH_LOG") {
        let mut file = std::fs::OpenOptions::new().create(true).append(true).open(log)?;
        writeln!(file, "launch {}", std::process::id())?;
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    // Non-protocol noise that clients must skip.
    writeln!(stdout, "{} starting", SERVER_NAME)?;
    stdout.flush()?;

    for line in stdin.lock().lines() {
        let line = line?;
        let message: Value = match serde_json::from_str(&line) {
            Ok(value) => value,
            Err(_) => continue,
        };

        let method = message.get("method").and_then(|m| m.as_str()).unwrap_or_default();
        let id = match message.get("id") {
            Some(id) => id.clone(),
            None => continue,
        };

        if exit_on.as_deref() == Some(method) {
            std::process::exit(3);
        }

        let reply = match method {
            "initialize" if hang_init => continue,
            "initialize" => json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "protocolVersion": message["params"]["protocolVersion"].as_str().unwrap_or("2024-11-05"),
                    "capabilities": {"tools": {}},
                    "serverInfo": {"name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION")},
                    "instructions": format!("program: {}", program)
                }
            }),
            "tools/list" => {
                let cursor = message["params"]["cursor"].as_str();
                // Notification mid-request, which clients must skip.
                respond(
                    &mut stdout,
                    json!({"jsonrpc": "2.0", "method": "notifications/message", "params": {"level": "info", "data": "listing"}}),
                )?;
                json!({"jsonrpc": "2.0", "id": id, "result": tools_page(cursor)})
            }
            "ping" => json!({"jsonrpc": "2.0", "id": id, "result": {}}),
            other => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {"code": -32601, "message": format!("Method not found: {}", other)}
            }),
        };

        respond(&mut stdout, reply)?;
    }

    if linger {
        std::thread::sleep(Duration::from_secs(60));
    }
    Ok(())
}
