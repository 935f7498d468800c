// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Backend Registry
//!
//! Maps each [`BackendKind`] compiled into this build to the factory that
//! constructs its driver. Kinds without a factory are unsupported.

use std::collections::HashMap;
use std::fmt;

use super::config::{BackendKind, NetworkConfig};
use super::driver::Driver;
use super::error::{NetworkError, NetworkResult};

/// Constructs a driver from its persisted configuration.
pub type DriverFactory = Box<dyn Fn(&NetworkConfig) -> NetworkResult<Box<dyn Driver>> + Send>;

/// Table of backends available to the subsystem.
pub struct BackendRegistry {
    factories: HashMap<BackendKind, DriverFactory>,
}

impl BackendRegistry {
    /// Creates a registry with no backends.
    pub fn empty() -> Self {
        BackendRegistry {
            factories: HashMap::new(),
        }
    }

    /// Creates a registry with every backend enabled by cargo features.
    pub fn compiled() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::empty();

        #[cfg(feature = "host-socket")]
        registry.register(
            BackendKind::HostSocket,
            Box::new(|config: &NetworkConfig| {
                let driver = super::host_socket::HostSocketDriver::from_config(config)?;
                Ok(Box::new(driver) as Box<dyn Driver>)
            }),
        );

        registry
    }

    /// Registers (or replaces) the factory for `kind`.
    pub fn register(&mut self, kind: BackendKind, factory: DriverFactory) {
        self.factories.insert(kind, factory);
    }

    /// Returns true if `kind` can be bound.
    pub fn supports(&self, kind: BackendKind) -> bool {
        self.factories.contains_key(&kind)
    }

    /// Returns the supported kinds in declaration order.
    pub fn available(&self) -> Vec<BackendKind> {
        BackendKind::ALL
            .into_iter()
            .filter(|kind| self.supports(*kind))
            .collect()
    }

    /// Constructs the driver for `config.backend`.
    pub fn create(&self, config: &NetworkConfig) -> NetworkResult<Box<dyn Driver>> {
        let factory = self
            .factories
            .get(&config.backend)
            .ok_or(NetworkError::UnsupportedBackend(config.backend))?;
        factory(config)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::compiled()
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("available", &self.available())
            .finish()
    }
}
