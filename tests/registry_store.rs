// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Registry persistence through the file-backed store.

use std::fs;

use mcp_explorer::{Protocol, RegistryError, RegistryStore, ServerDescriptor};
use serde_json::{json, Value};
use tempfile::TempDir;

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_add_stdio_server_writes_expected_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("mcp_servers.json");
    let store = RegistryStore::new(&path);

    store
        .add(ServerDescriptor::stdio("local", "run", "/abs/path/server"))
        .unwrap();

    assert_eq!(
        read_json(&path),
        json!({
            "local": {"protocol": "stdio", "command": "run", "program": "/abs/path/server"}
        })
    );

    let descriptor = store.try_load().unwrap().descriptor("local").unwrap();
    assert_eq!(descriptor.protocol(), Protocol::Stdio);
    assert_eq!(descriptor.record.endpoint(), "run /abs/path/server");
}

#[test]
fn test_duplicate_name_overwrites() {
    let temp = TempDir::new().unwrap();
    let store = RegistryStore::new(temp.path().join("servers.json"));

    store.add(ServerDescriptor::http("weather", "http://localhost:8000")).unwrap();
    store.add(ServerDescriptor::stdio("local", "uv run", "/srv/server.py")).unwrap();
    let registry = store
        .add(ServerDescriptor::stdio("weather", "node", "/srv/weather.js"))
        .unwrap();

    assert_eq!(registry.len(), 2);
    let weather = registry.get("weather").unwrap();
    assert_eq!(weather.protocol, Protocol::Stdio);
    assert!(weather.url.is_none());
    assert_eq!(store.try_load().unwrap(), registry);
}

#[test]
fn test_save_of_load_is_identity() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("servers.json");
    fs::write(
        &path,
        r#"{
            "weather": {"protocol": "http", "url": "http://localhost:8000", "owner": "ops", "tags": ["prod"]},
            "local": {"protocol": "stdio", "command": "uv run", "program": "/srv/server.py"}
        }"#,
    )
    .unwrap();
    let before = read_json(&path);

    let store = RegistryStore::new(&path);
    store.save(&store.try_load().unwrap()).unwrap();
    assert_eq!(read_json(&path), before);

    let first = fs::read_to_string(&path).unwrap();
    store.save(&store.try_load().unwrap()).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), first);
}

#[test]
fn test_missing_file_is_empty_without_error() {
    let temp = TempDir::new().unwrap();
    let loaded = RegistryStore::new(temp.path().join("absent.json")).load();
    assert!(loaded.registry.is_empty());
    assert!(loaded.error.is_none());
}

#[test]
fn test_corrupt_file_loads_empty_and_is_not_overwritten_by_add() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("servers.json");
    fs::write(&path, "{ not json").unwrap();
    let store = RegistryStore::new(&path);

    let loaded = store.load();
    assert!(loaded.registry.is_empty());
    assert!(matches!(loaded.error, Some(RegistryError::Corrupt { .. })));

    let err = store
        .add(ServerDescriptor::http("weather", "http://localhost:8000"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::Corrupt { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
}

#[test]
fn test_remove_persists() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("servers.json");
    let store = RegistryStore::new(&path);

    store.add(ServerDescriptor::http("weather", "http://localhost:8000")).unwrap();
    store.add(ServerDescriptor::stdio("local", "run", "/abs/path/server")).unwrap();
    store.remove("weather").unwrap();

    assert_eq!(
        read_json(&path),
        json!({"local": {"protocol": "stdio", "command": "run", "program": "/abs/path/server"}})
    );
    assert!(matches!(
        store.remove("weather"),
        Err(RegistryError::ServerNotFound(name)) if name == "weather"
    ));
}

#[test]
fn test_invalid_descriptor_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("servers.json");
    let store = RegistryStore::new(&path);

    let err = store.add(ServerDescriptor::http("", "http://localhost:8000")).unwrap_err();
    assert!(matches!(err, RegistryError::InvalidDescriptor { .. }));
    assert!(!path.exists());
}
