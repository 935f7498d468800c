// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Socket Descriptors
//!
//! Descriptors handed to upper layers and the table that tracks them for the
//! current binding.

use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddrV4;

use tracing::warn;

use super::driver::SocketId;
use super::error::{NetworkError, NetworkResult};

/// Descriptor for a socket created through the subsystem.
///
/// Only valid for the binding (epoch) that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Socket {
    id: SocketId,
    epoch: u64,
    serial: u64,
}

impl Socket {
    /// Backend descriptor.
    pub fn id(&self) -> SocketId {
        self.id
    }

    /// Epoch of the binding that issued this descriptor.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl fmt::Display for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.epoch)
    }
}

/// What a socket was created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketRole {
    /// Outgoing connection, or a connection accepted from a server.
    Client,
    /// Listening socket.
    Server,
}

/// Usability of a tracked socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    /// Usable.
    Open,
    /// The link dropped; the descriptor must be discarded.
    Invalidated,
}

/// Snapshot of a tracked socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketInfo {
    /// The descriptor.
    pub socket: Socket,
    /// Client or server.
    pub role: SocketRole,
    /// Remote endpoint for outgoing connections.
    pub peer: Option<SocketAddrV4>,
    /// Local endpoint, when the backend reports it.
    pub local: Option<SocketAddrV4>,
    /// Open or invalidated.
    pub state: SocketState,
}

#[derive(Debug, Clone)]
pub(crate) struct SocketRecord {
    serial: u64,
    pub(crate) role: SocketRole,
    pub(crate) peer: Option<SocketAddrV4>,
    pub(crate) state: SocketState,
}

/// Sockets outstanding on the current binding.
#[derive(Debug, Default)]
pub(crate) struct SocketTable {
    epoch: u64,
    next_serial: u64,
    records: BTreeMap<SocketId, SocketRecord>,
}

impl SocketTable {
    pub(crate) fn new() -> Self {
        SocketTable::default()
    }

    /// Starts tracking a new binding. Returns the sockets of the old one.
    pub(crate) fn reset(&mut self, epoch: u64) -> Vec<Socket> {
        let previous = self.sockets();
        self.records.clear();
        self.epoch = epoch;
        previous
    }

    pub(crate) fn insert(
        &mut self,
        id: SocketId,
        role: SocketRole,
        peer: Option<SocketAddrV4>,
    ) -> Socket {
        self.next_serial += 1;
        let serial = self.next_serial;
        let record = SocketRecord {
            serial,
            role,
            peer,
            state: SocketState::Open,
        };
        if self.records.insert(id, record).is_some() {
            warn!(socket = %id, "backend reused a tracked descriptor");
        }
        Socket {
            id,
            epoch: self.epoch,
            serial,
        }
    }

    /// Looks up a socket without checking whether it is still usable.
    pub(crate) fn get(&self, socket: Socket) -> NetworkResult<&SocketRecord> {
        if socket.epoch != self.epoch {
            return Err(NetworkError::SocketInvalidated);
        }
        match self.records.get(&socket.id) {
            Some(record) if record.serial == socket.serial => Ok(record),
            _ => Err(NetworkError::SocketClosed),
        }
    }

    /// Looks up a socket that must still be open.
    pub(crate) fn get_open(&self, socket: Socket) -> NetworkResult<&SocketRecord> {
        let record = self.get(socket)?;
        match record.state {
            SocketState::Open => Ok(record),
            SocketState::Invalidated => Err(NetworkError::SocketInvalidated),
        }
    }

    pub(crate) fn remove(&mut self, socket: Socket) -> Option<SocketRecord> {
        self.get(socket).ok()?;
        self.records.remove(&socket.id)
    }

    /// Marks every open socket invalidated. Returns the ones that changed.
    pub(crate) fn invalidate_all(&mut self) -> Vec<Socket> {
        let epoch = self.epoch;
        self.records
            .iter_mut()
            .filter(|(_, record)| record.state == SocketState::Open)
            .map(|(id, record)| {
                record.state = SocketState::Invalidated;
                Socket {
                    id: *id,
                    epoch,
                    serial: record.serial,
                }
            })
            .collect()
    }

    pub(crate) fn sockets(&self) -> Vec<Socket> {
        self.records
            .iter()
            .map(|(id, record)| Socket {
                id: *id,
                epoch: self.epoch,
                serial: record.serial,
            })
            .collect()
    }

    pub(crate) fn open_count(&self) -> usize {
        self.records
            .values()
            .filter(|record| record.state == SocketState::Open)
            .count()
    }
}
