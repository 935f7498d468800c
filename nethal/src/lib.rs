// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Nethal Core Library
//!
//! Hardware-agnostic network transport for the embedded runtime.
//! Concrete chip drivers plug in through the [`network::Driver`] trait.

pub mod network;

#[cfg(feature = "host-socket")]
pub use network::{HostSocketDriver, HostSocketParams};
pub use network::{
    BackendKind, BackendRegistry, ConfigStore, ConnectivityState, Driver, FaultScope,
    FileConfigStore, HandleId, LinkEvent, LinkReporter, MemoryConfigStore, MockDriver,
    NetworkConfig, NetworkError, NetworkEvent, NetworkHandle, NetworkResult, NetworkSubsystem,
    Socket, SocketId, SocketInfo, SocketRole, SocketState,
};
