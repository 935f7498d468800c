// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Driver Contract
//!
//! The operation table every backend implements. All methods are
//! single-shot and non-blocking: "not yet" is expressed with `Ok(0)` /
//! `Ok(None)` and the caller polls again on the next idle tick.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};

use super::config::BackendKind;
use super::error::NetworkResult;
use super::state::{FaultScope, LinkEvent};

/// Backend-scoped socket descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketId(pub u32);

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Collects link events reported by a backend during `idle`.
///
/// Events are applied by the subsystem, in order, once `idle` has returned.
#[derive(Debug, Default)]
pub struct LinkReporter {
    events: Vec<LinkEvent>,
}

impl LinkReporter {
    /// Creates an empty reporter.
    pub fn new() -> Self {
        LinkReporter { events: Vec::new() }
    }

    /// Records a link event.
    pub fn report(&mut self, event: LinkEvent) {
        self.events.push(event);
    }

    /// Returns the recorded events.
    pub fn events(&self) -> &[LinkEvent] {
        &self.events
    }

    pub(crate) fn take(&mut self) -> Vec<LinkEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Network backend driver.
///
/// One implementation exists per [`BackendKind`]. Implementations must never
/// block waiting on hardware: the host runs a single cooperative scheduler
/// and a blocking call would stall every socket at once.
///
/// # Example
///
/// ```ignore
/// use nethal::network::{Driver, LinkReporter};
///
/// let mut driver = HostSocketDriver::new(HostSocketParams::default());
/// let mut link = LinkReporter::new();
/// driver.idle(&mut link);
/// let server = driver.create_socket(Ipv4Addr::UNSPECIFIED, 8080)?;
/// ```
pub trait Driver: Send {
    /// Returns the backend kind this driver implements.
    fn kind(&self) -> BackendKind;

    /// Periodic housekeeping (poll the co-processor, progress DHCP, ...).
    ///
    /// Link changes are reported through `link`.
    fn idle(&mut self, link: &mut LinkReporter);

    /// Inspects fault flags and attempts best-effort local recovery.
    ///
    /// Returns true if the backend is error-free after the attempt.
    fn check_error(&mut self) -> bool;

    /// Demotion granularity applied when `check_error` returns false.
    fn fault_scope(&self) -> FaultScope {
        FaultScope::Link
    }

    /// Creates a socket.
    ///
    /// `host == Ipv4Addr::UNSPECIFIED` creates a listening socket on `port`;
    /// any other host creates a client socket and begins connecting.
    fn create_socket(&mut self, host: Ipv4Addr, port: u16) -> NetworkResult<SocketId>;

    /// Closes a socket. Unknown or already closed descriptors are ignored.
    fn close_socket(&mut self, socket: SocketId);

    /// Returns a pending connection on a server socket, if any.
    fn accept(&mut self, server: SocketId) -> NetworkResult<Option<SocketId>>;

    /// Resolves a hostname within a bounded amount of work.
    fn resolve_hostname(&mut self, name: &str) -> NetworkResult<Ipv4Addr>;

    /// Reads available bytes. `Ok(0)` means no data right now.
    fn recv(&mut self, socket: SocketId, buf: &mut [u8]) -> NetworkResult<usize>;

    /// Writes bytes. `Ok(0)` means the backend cannot take more data yet.
    fn send(&mut self, socket: SocketId, buf: &[u8]) -> NetworkResult<usize>;

    /// Local address a socket is bound to, when the backend knows it.
    fn local_addr(&self, _socket: SocketId) -> Option<SocketAddrV4> {
        None
    }

    /// Remote endpoint of a connected socket, when the backend knows it.
    fn peer_addr(&self, _socket: SocketId) -> Option<SocketAddrV4> {
        None
    }
}
