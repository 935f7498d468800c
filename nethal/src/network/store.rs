// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration Storage
//!
//! The host runtime owns where the active backend selection lives. The
//! subsystem only sees it through [`ConfigStore`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::config::NetworkConfig;
use super::error::{NetworkError, NetworkResult};

/// Persisted configuration storage.
pub trait ConfigStore: Send {
    /// Loads the persisted record. `Ok(None)` means nothing is configured.
    fn load(&self) -> NetworkResult<Option<NetworkConfig>>;

    /// Persists a record, replacing any previous one.
    fn save(&mut self, config: &NetworkConfig) -> NetworkResult<()>;

    /// Removes the persisted record.
    fn clear(&mut self) -> NetworkResult<()>;
}

/// In-process configuration store.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    config: Option<NetworkConfig>,
}

impl MemoryConfigStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        MemoryConfigStore { config: None }
    }

    /// Creates a store holding `config`.
    pub fn with_config(config: NetworkConfig) -> Self {
        MemoryConfigStore {
            config: Some(config),
        }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> NetworkResult<Option<NetworkConfig>> {
        Ok(self.config.clone())
    }

    fn save(&mut self, config: &NetworkConfig) -> NetworkResult<()> {
        self.config = Some(config.clone());
        Ok(())
    }

    fn clear(&mut self) -> NetworkResult<()> {
        self.config = None;
        Ok(())
    }
}

/// JSON file configuration store. A missing file means "not configured".
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    /// Creates a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileConfigStore { path: path.into() }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> NetworkResult<Option<NetworkConfig>> {
        match fs::read_to_string(&self.path) {
            Ok(json) => NetworkConfig::from_json(&json).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(NetworkError::Storage(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn save(&mut self, config: &NetworkConfig) -> NetworkResult<()> {
        let json = config.to_json()?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| NetworkError::Storage(e.to_string()))?;
            }
        }
        fs::write(&self.path, json).map_err(|e| NetworkError::Storage(e.to_string()))?;
        debug!(path = %self.path.display(), backend = %config.backend, "saved network config");
        Ok(())
    }

    fn clear(&mut self) -> NetworkResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(NetworkError::Storage(e.to_string())),
        }
    }
}
