// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network Handle
//!
//! The bound backend: its configuration plus the driver built from it.

use std::fmt;

use super::config::{BackendKind, NetworkConfig};
use super::driver::Driver;

/// Identity of one binding.
///
/// Two handles with the same id are the same logical handle; a rebuild
/// always gets a new epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId {
    /// Backend kind of the binding.
    pub kind: BackendKind,
    /// Binding epoch, unique per subsystem.
    pub epoch: u64,
}

/// The active backend binding.
///
/// Owned by [`NetworkSubsystem`](super::NetworkSubsystem); callers only ever
/// borrow it for one operation.
pub struct NetworkHandle {
    config: NetworkConfig,
    driver: Box<dyn Driver>,
    epoch: u64,
}

impl NetworkHandle {
    pub(crate) fn new(config: NetworkConfig, driver: Box<dyn Driver>, epoch: u64) -> Self {
        NetworkHandle {
            config,
            driver,
            epoch,
        }
    }

    /// Returns the binding identity.
    pub fn id(&self) -> HandleId {
        HandleId {
            kind: self.kind(),
            epoch: self.epoch,
        }
    }

    /// Returns the backend kind.
    pub fn kind(&self) -> BackendKind {
        self.config.backend
    }

    /// Returns the binding epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Returns the configuration the handle was built from.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub(crate) fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    pub(crate) fn driver_mut(&mut self) -> &mut dyn Driver {
        self.driver.as_mut()
    }
}

impl PartialEq for NetworkHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl fmt::Debug for NetworkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkHandle")
            .field("kind", &self.kind())
            .field("epoch", &self.epoch)
            .finish()
    }
}
