// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tracing and metrics for the explorer.
//!
//! - **Tracing**: structured logging through `tracing-subscriber`
//! - **Metrics**: per-operation counters and latency histograms
//!
//! # Usage
//!
//! ```rust,ignore
//! use mcp_explorer::telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(&TelemetryConfig::default())?;
//! ```

mod init;
pub mod metrics;

pub use init::{init_telemetry, TelemetryConfig, TelemetryGuard};
pub use metrics::{Histogram, Metrics, MetricsSnapshot, OperationMetrics, GLOBAL_METRICS};
