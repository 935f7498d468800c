// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Backend Configuration
//!
//! The persisted record naming the active backend and carrying its
//! backend-specific parameters.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::{NetworkError, NetworkResult};

/// Network medium a backend drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Host operating system socket API.
    HostSocket,
    /// Discrete WiFi co-processor.
    WifiCoprocessor,
    /// Discrete Ethernet controller.
    EthernetCoprocessor,
}

impl BackendKind {
    /// All backend kinds, in declaration order.
    pub const ALL: [BackendKind; 3] = [
        BackendKind::HostSocket,
        BackendKind::WifiCoprocessor,
        BackendKind::EthernetCoprocessor,
    ];

    /// Stable name used in logs and the persisted record.
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::HostSocket => "host_socket",
            BackendKind::WifiCoprocessor => "wifi_coprocessor",
            BackendKind::EthernetCoprocessor => "ethernet_coprocessor",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted network configuration.
///
/// `params` is opaque to the subsystem; each backend decodes its own
/// parameter type from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// The backend to bind.
    pub backend: BackendKind,
    /// Backend-specific parameter blob.
    #[serde(default)]
    pub params: Vec<u8>,
}

impl NetworkConfig {
    /// Creates a config with default backend parameters.
    pub fn new(backend: BackendKind) -> Self {
        NetworkConfig {
            backend,
            params: Vec::new(),
        }
    }

    /// Creates a config with encoded backend parameters.
    pub fn with_params<P: Serialize>(backend: BackendKind, params: &P) -> NetworkResult<Self> {
        Ok(NetworkConfig {
            backend,
            params: serde_json::to_vec(params)?,
        })
    }

    /// Decodes the backend parameters.
    ///
    /// An empty blob yields `P::default()`.
    pub fn params<P: DeserializeOwned + Default>(&self) -> NetworkResult<P> {
        if self.params.is_empty() {
            return Ok(P::default());
        }
        serde_json::from_slice(&self.params).map_err(|e| {
            NetworkError::InvalidConfiguration(format!("{} params: {}", self.backend, e))
        })
    }

    /// Serializes the record to JSON.
    pub fn to_json(&self) -> NetworkResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a record from JSON.
    pub fn from_json(json: &str) -> NetworkResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
