// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Durable registry of named MCP server descriptors.
//!
//! The registry is pure storage: a name-keyed map persisted as one JSON file.
//! Loading never fails the caller (a damaged file yields an empty registry
//! plus the error), and saving replaces the whole file atomically.
//!
//! # Example
//!
//! ```rust,ignore
//! use mcp_explorer::registry::{RegistryStore, ServerDescriptor};
//!
//! let store = RegistryStore::new("mcp_servers.json");
//! let mut loaded = store.load();
//! loaded.registry.add(ServerDescriptor::stdio("local", "uv run", "/srv/server.py"))?;
//! store.save(&loaded.registry)?;
//! ```

mod store;
mod types;

pub use store::{LoadedRegistry, Registry, RegistryStore, DEFAULT_REGISTRY_FILE};
pub(crate) use store::write_atomic;
pub use types::{Protocol, ServerDescriptor, ServerRecord};
