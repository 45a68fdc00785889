// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! In-memory registry and its JSON file store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

use super::types::{Protocol, ServerDescriptor, ServerRecord};

/// Default registry file name, relative to the working directory.
pub const DEFAULT_REGISTRY_FILE: &str = "mcp_servers.json";

/// Mapping from server name to its connection record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    servers: BTreeMap<String, ServerRecord>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a server, replacing any existing entry with the same name.
    ///
    /// The previous record is returned whole; fields are never merged.
    pub fn add(&mut self, descriptor: ServerDescriptor) -> Result<Option<ServerRecord>, RegistryError> {
        descriptor.validate()?;
        Ok(self.servers.insert(descriptor.name, descriptor.record))
    }

    /// Remove a server by name.
    pub fn remove(&mut self, name: &str) -> Option<ServerRecord> {
        self.servers.remove(name)
    }

    /// Get a record by name.
    pub fn get(&self, name: &str) -> Option<&ServerRecord> {
        self.servers.get(name)
    }

    /// Get a full descriptor by name.
    pub fn descriptor(&self, name: &str) -> Option<ServerDescriptor> {
        self.servers
            .get(name)
            .map(|record| ServerDescriptor::new(name, record.clone()))
    }

    /// Descriptors using the given protocol, in name order.
    pub fn by_protocol(&self, protocol: Protocol) -> Vec<ServerDescriptor> {
        self.servers
            .iter()
            .filter(|(_, record)| record.protocol == protocol)
            .map(|(name, record)| ServerDescriptor::new(name.clone(), record.clone()))
            .collect()
    }

    /// Server names, in order.
    pub fn names(&self) -> Vec<&str> {
        self.servers.keys().map(|s| s.as_str()).collect()
    }

    /// Iterate over `(name, record)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ServerRecord)> {
        self.servers.iter()
    }

    /// Number of registered servers.
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Whether no servers are registered.
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Parse a registry from JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to pretty JSON (two-space indent).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Result of a non-failing load: the registry plus the error that forced it empty, if any.
#[derive(Debug, Default)]
pub struct LoadedRegistry {
    pub registry: Registry,
    pub error: Option<RegistryError>,
}

/// JSON file backing a [`Registry`].
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    /// Create a store for the given file path. No I/O happens until load/save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the registry, failing on unreadable or corrupt files.
    ///
    /// A missing file is a fresh registry, not an error.
    pub fn try_load(&self) -> Result<Registry, RegistryError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "registry file not found, starting empty");
                return Ok(Registry::new());
            }
            Err(e) => {
                return Err(RegistryError::ReadFailed {
                    path: self.path.display().to_string(),
                    message: e.to_string(),
                })
            }
        };

        Registry::from_json(&content).map_err(|e| RegistryError::Corrupt {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load the registry without failing.
    ///
    /// Unreadable or corrupt storage yields an empty registry and the error,
    /// so the explorer stays usable with zero servers.
    pub fn load(&self) -> LoadedRegistry {
        match self.try_load() {
            Ok(registry) => LoadedRegistry {
                registry,
                error: None,
            },
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to load registry");
                LoadedRegistry {
                    registry: Registry::new(),
                    error: Some(e),
                }
            }
        }
    }

    /// Overwrite the file with the given registry.
    ///
    /// Content goes to a sibling temp file first and is renamed into place,
    /// so readers never observe a partial write.
    pub fn save(&self, registry: &Registry) -> Result<(), RegistryError> {
        let content = registry.to_json_pretty().map_err(|e| self.write_failed(e))?;
        write_atomic(&self.path, &content).map_err(|e| self.write_failed(e))?;
        tracing::debug!(path = %self.path.display(), servers = registry.len(), "saved registry");
        Ok(())
    }

    /// Add a server and persist immediately.
    pub fn add(&self, descriptor: ServerDescriptor) -> Result<Registry, RegistryError> {
        let mut registry = self.try_load()?;
        registry.add(descriptor)?;
        self.save(&registry)?;
        Ok(registry)
    }

    /// Remove a server and persist immediately.
    pub fn remove(&self, name: &str) -> Result<Registry, RegistryError> {
        let mut registry = self.try_load()?;
        if registry.remove(name).is_none() {
            return Err(RegistryError::ServerNotFound(name.to_string()));
        }
        self.save(&registry)?;
        Ok(registry)
    }

    fn write_failed(&self, err: impl std::fmt::Display) -> RegistryError {
        RegistryError::WriteFailed {
            path: self.path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// Write `content` to `path` through a temp file and rename.
pub(crate) fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, content)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }
    Ok(())
}
