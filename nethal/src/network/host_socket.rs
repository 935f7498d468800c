// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Host Socket Backend
//!
//! Driver over the host operating system's socket API. No call waits on the
//! network:
//! - listeners and streams run in non-blocking mode
//! - client sockets start connecting and report `Ok(0)` from `send`/`recv`
//!   until the handshake completes or `connect_timeout_ms` expires
//! - hostname lookups run on a helper thread; `resolve_hostname` waits at
//!   most `resolve_timeout_ms` and otherwise fails with "lookup pending",
//!   picking the answer up on a later call

use std::collections::{BTreeMap, HashMap};
use std::io::{self, ErrorKind, Read, Write};
use std::net::{
    Ipv4Addr, Shutdown, SocketAddr, SocketAddrV4, TcpListener, TcpStream, ToSocketAddrs,
};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use socket2::{Domain, Protocol, Type};
use tracing::{debug, warn};

use super::config::{BackendKind, NetworkConfig};
use super::driver::{Driver, LinkReporter, SocketId};
use super::error::{NetworkError, NetworkResult};
use super::state::LinkEvent;

/// Parameters for the host socket backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSocketParams {
    /// Time a client socket may spend connecting, in milliseconds.
    pub connect_timeout_ms: u64,
    /// Longest a single `resolve_hostname` call waits, in milliseconds.
    pub resolve_timeout_ms: u64,
    /// Address server sockets bind to.
    pub bind_address: Ipv4Addr,
}

impl Default for HostSocketParams {
    fn default() -> Self {
        HostSocketParams {
            connect_timeout_ms: 10_000,
            resolve_timeout_ms: 50,
            bind_address: Ipv4Addr::UNSPECIFIED,
        }
    }
}

type Lookup = Receiver<Result<Ipv4Addr, String>>;

struct HostStream {
    stream: TcpStream,
    /// Set while the handshake is still in flight.
    connect_deadline: Option<Instant>,
}

impl HostStream {
    /// Returns true once the stream is connected.
    fn poll_connected(&mut self, socket: SocketId) -> NetworkResult<bool> {
        let Some(deadline) = self.connect_deadline else {
            return Ok(true);
        };
        if let Some(err) = self.stream.take_error()? {
            return Err(err.into());
        }
        match self.stream.peer_addr() {
            Ok(peer) => {
                self.connect_deadline = None;
                debug!(%socket, %peer, "host stream connected");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotConnected => {
                if Instant::now() >= deadline {
                    Err(NetworkError::Transport(format!("{socket}: connect timed out")))
                } else {
                    Ok(false)
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

enum HostSocket {
    Listener(TcpListener),
    Stream(HostStream),
}

/// Host OS socket driver.
pub struct HostSocketDriver {
    params: HostSocketParams,
    sockets: BTreeMap<SocketId, HostSocket>,
    lookups: HashMap<String, Lookup>,
    next_id: u32,
    link_reported: bool,
}

impl HostSocketDriver {
    /// Creates a driver with the given parameters.
    pub fn new(params: HostSocketParams) -> Self {
        HostSocketDriver {
            params,
            sockets: BTreeMap::new(),
            lookups: HashMap::new(),
            next_id: 0,
            link_reported: false,
        }
    }

    /// Creates a driver from a persisted config record.
    pub fn from_config(config: &NetworkConfig) -> NetworkResult<Self> {
        if config.backend != BackendKind::HostSocket {
            return Err(NetworkError::InvalidConfiguration(format!(
                "expected {} config, got {}",
                BackendKind::HostSocket,
                config.backend
            )));
        }
        Ok(Self::new(config.params()?))
    }

    /// Returns the driver parameters.
    pub fn params(&self) -> &HostSocketParams {
        &self.params
    }

    fn allocate(&mut self, socket: HostSocket) -> SocketId {
        // Skip descriptors still open after the counter wraps.
        while self.sockets.contains_key(&SocketId(self.next_id)) {
            self.next_id = self.next_id.wrapping_add(1);
        }
        let id = SocketId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.sockets.insert(id, socket);
        id
    }

    /// Returns the connected stream, or `None` while still connecting.
    fn stream(&mut self, socket: SocketId) -> NetworkResult<Option<&mut TcpStream>> {
        let conn = match self.sockets.get_mut(&socket) {
            Some(HostSocket::Stream(conn)) => conn,
            Some(HostSocket::Listener(_)) => {
                return Err(NetworkError::InvalidOperation(format!(
                    "{socket} is a listening socket"
                )))
            }
            None => return Err(NetworkError::Transport(format!("{socket} is not open"))),
        };
        if conn.poll_connected(socket)? {
            Ok(Some(&mut conn.stream))
        } else {
            Ok(None)
        }
    }

    fn listen(&mut self, port: u16) -> NetworkResult<SocketId> {
        let listener = TcpListener::bind((self.params.bind_address, port))?;
        listener.set_nonblocking(true)?;
        debug!(port, "host listener bound");
        Ok(self.allocate(HostSocket::Listener(listener)))
    }

    fn connect(&mut self, host: Ipv4Addr, port: u16) -> NetworkResult<SocketId> {
        let addr = SocketAddr::V4(SocketAddrV4::new(host, port));
        let socket = socket2::Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
        socket.set_nonblocking(true)?;

        let connect_deadline = match socket.connect(&addr.into()) {
            Ok(()) => None,
            Err(e) if connect_in_progress(&e) => {
                let timeout = Duration::from_millis(self.params.connect_timeout_ms.max(1));
                Some(Instant::now() + timeout)
            }
            Err(e) => return Err(e.into()),
        };

        let stream: TcpStream = socket.into();
        stream.set_nodelay(true)?;
        debug!(%addr, connecting = connect_deadline.is_some(), "host stream created");
        Ok(self.allocate(HostSocket::Stream(HostStream {
            stream,
            connect_deadline,
        })))
    }
}

impl Default for HostSocketDriver {
    fn default() -> Self {
        Self::new(HostSocketParams::default())
    }
}

fn connect_in_progress(err: &io::Error) -> bool {
    #[cfg(unix)]
    let in_progress = err.raw_os_error() == Some(libc::EINPROGRESS);
    #[cfg(not(unix))]
    let in_progress = false;
    in_progress || err.kind() == ErrorKind::WouldBlock
}

fn spawn_lookup(name: &str) -> NetworkResult<Lookup> {
    let (tx, rx) = mpsc::channel();
    let host = name.to_string();
    thread::Builder::new()
        .name("nethal-resolve".into())
        .spawn(move || {
            // The receiver may be gone if the driver was dropped.
            let _ = tx.send(lookup_ipv4(&host));
        })
        .map_err(|e| NetworkError::ResolutionFailed(format!("{name}: {e}")))?;
    Ok(rx)
}

fn lookup_ipv4(host: &str) -> Result<Ipv4Addr, String> {
    let addrs = (host, 0).to_socket_addrs().map_err(|e| e.to_string())?;
    addrs
        .filter_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(*v4.ip()),
            SocketAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| "no IPv4 address".to_string())
}

impl Driver for HostSocketDriver {
    fn kind(&self) -> BackendKind {
        BackendKind::HostSocket
    }

    fn idle(&mut self, link: &mut LinkReporter) {
        // The host OS owns its interfaces; treat it as routable once bound.
        if !self.link_reported {
            link.report(LinkEvent::LinkUp);
            link.report(LinkEvent::AddressAcquired);
            self.link_reported = true;
        }
    }

    fn check_error(&mut self) -> bool {
        true
    }

    fn create_socket(&mut self, host: Ipv4Addr, port: u16) -> NetworkResult<SocketId> {
        if host.is_unspecified() {
            self.listen(port)
        } else {
            self.connect(host, port)
        }
    }

    fn close_socket(&mut self, socket: SocketId) {
        if let Some(HostSocket::Stream(conn)) = self.sockets.remove(&socket) {
            let _ = conn.stream.shutdown(Shutdown::Both);
        }
    }

    fn accept(&mut self, server: SocketId) -> NetworkResult<Option<SocketId>> {
        let listener = match self.sockets.get(&server) {
            Some(HostSocket::Listener(listener)) => listener,
            Some(HostSocket::Stream(_)) => {
                return Err(NetworkError::InvalidOperation(format!(
                    "{server} is not a listening socket"
                )))
            }
            None => return Err(NetworkError::Transport(format!("{server} is not open"))),
        };

        match listener.accept() {
            Ok((stream, peer)) => {
                stream.set_nonblocking(true)?;
                debug!(%peer, "host connection accepted");
                Ok(Some(self.allocate(HostSocket::Stream(HostStream {
                    stream,
                    connect_deadline: None,
                }))))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => {
                warn!(%server, error = %e, "host accept failed");
                Err(e.into())
            }
        }
    }

    fn resolve_hostname(&mut self, name: &str) -> NetworkResult<Ipv4Addr> {
        let lookup = match self.lookups.remove(name) {
            Some(lookup) => lookup,
            None => spawn_lookup(name)?,
        };

        let wait = Duration::from_millis(self.params.resolve_timeout_ms);
        match lookup.recv_timeout(wait) {
            Ok(result) => {
                result.map_err(|e| NetworkError::ResolutionFailed(format!("{name}: {e}")))
            }
            Err(RecvTimeoutError::Timeout) => {
                self.lookups.insert(name.to_string(), lookup);
                Err(NetworkError::ResolutionFailed(format!("{name}: lookup pending")))
            }
            Err(RecvTimeoutError::Disconnected) => Err(NetworkError::ResolutionFailed(format!(
                "{name}: resolver exited"
            ))),
        }
    }

    fn recv(&mut self, socket: SocketId, buf: &mut [u8]) -> NetworkResult<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let Some(stream) = self.stream(socket)? else {
            return Ok(0);
        };
        match stream.read(buf) {
            Ok(0) => Err(NetworkError::ConnectionClosed),
            Ok(read) => Ok(read),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn send(&mut self, socket: SocketId, buf: &[u8]) -> NetworkResult<usize> {
        let Some(stream) = self.stream(socket)? else {
            return Ok(0);
        };
        match stream.write(buf) {
            Ok(sent) => Ok(sent),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn local_addr(&self, socket: SocketId) -> Option<SocketAddrV4> {
        let addr = match self.sockets.get(&socket)? {
            HostSocket::Listener(listener) => listener.local_addr().ok()?,
            HostSocket::Stream(conn) => conn.stream.local_addr().ok()?,
        };
        match addr {
            SocketAddr::V4(v4) => Some(v4),
            SocketAddr::V6(_) => None,
        }
    }

    fn peer_addr(&self, socket: SocketId) -> Option<SocketAddrV4> {
        match self.sockets.get(&socket)? {
            HostSocket::Stream(conn) => match conn.stream.peer_addr().ok()? {
                SocketAddr::V4(v4) => Some(v4),
                SocketAddr::V6(_) => None,
            },
            HostSocket::Listener(_) => None,
        }
    }
}
