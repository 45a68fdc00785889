// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Benchmarks for registry persistence, tool export and config loading.
//!
//! Run with: `cargo bench --bench registry`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use tempfile::TempDir;

use mcp_explorer::config::{load_config, CliOptions};
use mcp_explorer::mcp::{ToolDescriptor, ToolExport};
use mcp_explorer::{Registry, RegistryStore, ServerDescriptor};

fn registry_of(size: usize) -> Registry {
    let mut registry = Registry::new();
    for i in 0..size {
        let descriptor = if i % 2 == 0 {
            ServerDescriptor::http(format!("http-{i}"), format!("http://localhost:{}", 8000 + i))
        } else {
            ServerDescriptor::stdio(format!("stdio-{i}"), "uv run", format!("/srv/server_{i}.py"))
        };
        registry.add(descriptor).unwrap();
    }
    registry
}

fn tools_of(size: usize) -> Vec<ToolDescriptor> {
    (0..size)
        .map(|i| {
            ToolDescriptor::from_value(serde_json::json!({
                "name": format!("tool_{i}"),
                "description": "Benchmark tool",
                "inputSchema": {"type": "object", "properties": {"x": {"type": "number"}}}
            }))
            .unwrap()
        })
        .collect()
}

/// Registry JSON parse and serialize at several sizes.
fn bench_registry_json(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry_json");

    for size in [10, 100, 1000] {
        let registry = registry_of(size);
        let json = registry.to_json_pretty().unwrap();
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("parse", size), &json, |b, json| {
            b.iter(|| Registry::from_json(black_box(json)));
        });

        group.bench_with_input(BenchmarkId::new("serialize", size), &registry, |b, registry| {
            b.iter(|| black_box(registry).to_json_pretty());
        });
    }

    group.finish();
}

/// Store load and save against a temp file.
fn bench_registry_store(c: &mut Criterion) {
    let temp = TempDir::new().unwrap();
    let store = RegistryStore::new(temp.path().join("mcp_servers.json"));
    let registry = registry_of(100);
    store.save(&registry).unwrap();

    let mut group = c.benchmark_group("registry_store");
    group.throughput(Throughput::Elements(1));

    group.bench_function("load", |b| {
        b.iter(|| store.load());
    });

    group.bench_function("save", |b| {
        b.iter(|| store.save(black_box(&registry)));
    });

    group.finish();
}

/// Building and serializing a tool export.
fn bench_tool_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("tool_export");

    for size in [10, 100] {
        let tools = tools_of(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("from_tools", size), &tools, |b, tools| {
            b.iter(|| ToolExport::from_tools(black_box(tools)));
        });

        let export = ToolExport::from_tools(&tools);
        group.bench_with_input(BenchmarkId::new("to_json", size), &export, |b, export| {
            b.iter(|| black_box(export).to_json_pretty());
        });
    }

    group.finish();
}

/// Config resolution with and without a workspace file.
fn bench_config_loading(c: &mut Criterion) {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join(".mcp-explorer.json"),
        r#"{"registryPath": "servers.json", "requestTimeoutSec": 10}"#,
    )
    .unwrap();
    let empty = TempDir::new().unwrap();

    let mut group = c.benchmark_group("config_loading");
    group.throughput(Throughput::Elements(1));

    group.bench_function("load_json_config", |b| {
        b.iter(|| load_config(black_box(temp.path()), black_box(CliOptions::default())));
    });

    group.bench_function("load_defaults_only", |b| {
        b.iter(|| load_config(black_box(empty.path()), black_box(CliOptions::default())));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_registry_json,
    bench_registry_store,
    bench_tool_export,
    bench_config_loading,
);

criterion_main!(benches);
