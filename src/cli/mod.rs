// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Presentation layer: one-shot commands and the interactive explorer.
//!
//! Everything here drives [`McpClient`](crate::mcp::McpClient) and the
//! registry; nothing touches a transport directly.

pub mod commands;
pub mod explore;
pub mod render;

use std::future::Future;

use crate::mcp::CancelHandle;

pub use commands::{ConnectTarget, OutputFormat};
pub use explore::{Explorer, ReplCommand};

/// Run `op`, cancelling it through `handle` if Ctrl-C arrives first.
///
/// The operation still runs to completion after cancelling so the client
/// can finish tearing down.
pub async fn interruptible<T>(handle: CancelHandle, op: impl Future<Output = T>) -> T {
    tokio::pin!(op);
    tokio::select! {
        out = &mut op => out,
        _ = tokio::signal::ctrl_c() => {
            tracing::debug!("interrupt received, cancelling");
            handle.cancel();
            op.await
        }
    }
}
