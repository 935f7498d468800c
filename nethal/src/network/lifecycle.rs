// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Socket Lifecycle
//!
//! Every socket operation goes through the same gates:
//! - no bound handle: `NotConfigured`, nothing touched; descriptors issued
//!   by an unbound handle get `SocketInvalidated` instead
//! - routable operations (client connect, resolve) while not Online: `NotOnline`
//! - stale or invalidated descriptors: `SocketInvalidated`
//!
//! Send and receive are single attempts. `Ok(0)` is passed straight back so
//! the caller retries on a later tick; a backend error closes the socket.

use std::net::{Ipv4Addr, SocketAddrV4};

use tracing::{debug, warn};

use super::error::{NetworkError, NetworkResult};
use super::events::NetworkEvent;
use super::socket::{Socket, SocketInfo, SocketRole};
use super::subsystem::NetworkSubsystem;

impl NetworkSubsystem {
    /// Creates a socket.
    ///
    /// `host == Ipv4Addr::UNSPECIFIED` creates a server listening on `port`;
    /// otherwise a client connecting to `host:port`, which requires Online.
    pub fn create_socket(&mut self, host: Ipv4Addr, port: u16) -> NetworkResult<Socket> {
        let handle = self.handle.as_mut().ok_or(NetworkError::NotConfigured)?;

        let role = if host.is_unspecified() {
            SocketRole::Server
        } else {
            SocketRole::Client
        };
        if role == SocketRole::Client && !self.state.is_online() {
            warn!(state = %self.state, %host, port, "not connected to the internet");
            return Err(NetworkError::NotOnline(self.state));
        }

        let id = handle.driver_mut().create_socket(host, port)?;
        let peer = match role {
            SocketRole::Client => Some(SocketAddrV4::new(host, port)),
            SocketRole::Server => None,
        };
        let socket = self.sockets.insert(id, role, peer);
        debug!(%socket, ?role, port, "socket created");
        Ok(socket)
    }

    /// Creates a server socket listening on `port`.
    pub fn listen(&mut self, port: u16) -> NetworkResult<Socket> {
        self.create_socket(Ipv4Addr::UNSPECIFIED, port)
    }

    /// Creates a client socket connecting to `host:port`.
    pub fn connect(&mut self, host: Ipv4Addr, port: u16) -> NetworkResult<Socket> {
        if host.is_unspecified() {
            return Err(NetworkError::InvalidOperation(
                "cannot connect to the unspecified address".into(),
            ));
        }
        self.create_socket(host, port)
    }

    /// Closes a socket.
    ///
    /// Always permitted; closing a closed, stale or unknown descriptor does
    /// nothing.
    pub fn close_socket(&mut self, socket: Socket) {
        let Some(handle) = self.handle.as_mut() else {
            return;
        };
        if self.sockets.remove(socket).is_some() {
            handle.driver_mut().close_socket(socket.id());
            debug!(%socket, "socket closed");
        }
    }

    /// Accepts a pending connection on a server socket.
    ///
    /// Returns `Ok(None)` when no connection is waiting.
    pub fn accept(&mut self, server: Socket) -> NetworkResult<Option<Socket>> {
        if self.handle.is_none() {
            return Err(self.unbound_error(server));
        }
        let handle = self.handle.as_mut().ok_or(NetworkError::NotConfigured)?;
        if self.sockets.get_open(server)?.role != SocketRole::Server {
            return Err(NetworkError::InvalidOperation(
                "accept on a client socket".into(),
            ));
        }

        match handle.driver_mut().accept(server.id())? {
            Some(id) => {
                let peer = handle.driver().peer_addr(id);
                let socket = self.sockets.insert(id, SocketRole::Client, peer);
                debug!(%server, %socket, ?peer, "connection accepted");
                Ok(Some(socket))
            }
            None => Ok(None),
        }
    }

    /// Resolves a hostname. Requires Online.
    ///
    /// Dotted-quad literals are parsed locally without asking the backend.
    pub fn resolve_hostname(&mut self, name: &str) -> NetworkResult<Ipv4Addr> {
        let handle = self.handle.as_mut().ok_or(NetworkError::NotConfigured)?;
        if !self.state.is_online() {
            warn!(state = %self.state, name, "not connected to the internet");
            return Err(NetworkError::NotOnline(self.state));
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(NetworkError::ResolutionFailed("empty hostname".into()));
        }
        if let Ok(addr) = name.parse::<Ipv4Addr>() {
            return Ok(addr);
        }

        let addr = handle.driver_mut().resolve_hostname(name)?;
        debug!(name, %addr, "hostname resolved");
        Ok(addr)
    }

    /// Receives into `buf`.
    ///
    /// `Ok(0)` means no data right now, not end of stream. On error the
    /// socket has been closed and the descriptor must be discarded.
    pub fn recv(&mut self, socket: Socket, buf: &mut [u8]) -> NetworkResult<usize> {
        if self.handle.is_none() {
            return Err(self.unbound_error(socket));
        }
        let handle = self.handle.as_mut().ok_or(NetworkError::NotConfigured)?;
        self.sockets.get_open(socket)?;

        match handle.driver_mut().recv(socket.id(), buf) {
            Ok(read) => Ok(read),
            Err(err) => Err(self.close_after_failure(socket, err)),
        }
    }

    /// Sends from `buf`.
    ///
    /// `Ok(0)` means the backend cannot take more data yet. On error the
    /// socket has been closed and the descriptor must be discarded.
    pub fn send(&mut self, socket: Socket, buf: &[u8]) -> NetworkResult<usize> {
        if self.handle.is_none() {
            return Err(self.unbound_error(socket));
        }
        let handle = self.handle.as_mut().ok_or(NetworkError::NotConfigured)?;
        self.sockets.get_open(socket)?;

        match handle.driver_mut().send(socket.id(), buf) {
            Ok(sent) => Ok(sent),
            Err(err) => Err(self.close_after_failure(socket, err)),
        }
    }

    /// Returns a snapshot of a tracked socket.
    pub fn socket_info(&self, socket: Socket) -> NetworkResult<SocketInfo> {
        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| self.unbound_error(socket))?;
        let record = self.sockets.get(socket)?;
        Ok(SocketInfo {
            socket,
            role: record.role,
            peer: record.peer,
            local: handle.driver().local_addr(socket.id()),
            state: record.state,
        })
    }

    /// Returns snapshots of every tracked socket.
    pub fn sockets(&self) -> Vec<SocketInfo> {
        self.sockets
            .sockets()
            .into_iter()
            .filter_map(|socket| self.socket_info(socket).ok())
            .collect()
    }

    /// Returns the number of open (not invalidated) sockets.
    pub fn open_socket_count(&self) -> usize {
        self.sockets.open_count()
    }

    fn close_after_failure(&mut self, socket: Socket, err: NetworkError) -> NetworkError {
        warn!(%socket, error = %err, "transport failure, closing socket");
        self.close_socket(socket);
        if self.has_event_handlers() {
            self.dispatch(NetworkEvent::SocketClosed {
                socket,
                reason: err.to_string(),
            });
        }
        err
    }
}
