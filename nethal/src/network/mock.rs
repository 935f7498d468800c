// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mock Driver
//!
//! Scriptable in-memory backend for tests. Clones share state, so a test
//! keeps one clone for inspection while the subsystem owns another.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;

use parking_lot::Mutex;

use super::config::{BackendKind, NetworkConfig};
use super::driver::{Driver, LinkReporter, SocketId};
use super::error::{NetworkError, NetworkResult};
use super::registry::{BackendRegistry, DriverFactory};
use super::state::{FaultScope, LinkEvent};

/// Scripted outcome of one `recv` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockRecv {
    /// Bytes become available.
    Data(Vec<u8>),
    /// Nothing available (`Ok(0)`).
    Empty,
    /// Transport failure.
    Fail,
}

/// Scripted outcome of one `send` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockSend {
    /// All bytes accepted.
    Accept,
    /// Backend busy (`Ok(0)`).
    Busy,
    /// Transport failure.
    Fail,
}

#[derive(Debug)]
struct MockState {
    next_id: u32,
    open: BTreeSet<SocketId>,
    listeners: BTreeMap<SocketId, u16>,
    pending: HashMap<SocketId, VecDeque<Option<SocketAddrV4>>>,
    peers: HashMap<SocketId, SocketAddrV4>,
    idle_script: VecDeque<Vec<LinkEvent>>,
    healthy: bool,
    fault_scope: FaultScope,
    recv_script: HashMap<SocketId, VecDeque<MockRecv>>,
    send_script: HashMap<SocketId, VecDeque<MockSend>>,
    sent: HashMap<SocketId, Vec<u8>>,
    closed: Vec<SocketId>,
    hosts: HashMap<String, Ipv4Addr>,
    create_error: Option<NetworkError>,
    created: Vec<(Ipv4Addr, u16)>,
    init_count: usize,
    idle_calls: usize,
    check_error_calls: usize,
    resolve_calls: usize,
}

impl Default for MockState {
    fn default() -> Self {
        MockState {
            next_id: 0,
            open: BTreeSet::new(),
            listeners: BTreeMap::new(),
            pending: HashMap::new(),
            peers: HashMap::new(),
            idle_script: VecDeque::new(),
            healthy: true,
            fault_scope: FaultScope::Link,
            recv_script: HashMap::new(),
            send_script: HashMap::new(),
            sent: HashMap::new(),
            closed: Vec::new(),
            hosts: HashMap::new(),
            create_error: None,
            created: Vec::new(),
            init_count: 0,
            idle_calls: 0,
            check_error_calls: 0,
            resolve_calls: 0,
        }
    }
}

/// Mock backend driver for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockDriver::new(BackendKind::HostSocket);
/// let mut registry = BackendRegistry::empty();
/// mock.register(&mut registry);
///
/// mock.script_tick([LinkEvent::LinkUp]);
/// mock.script_tick([LinkEvent::AddressAcquired]);
/// ```
#[derive(Debug, Clone)]
pub struct MockDriver {
    kind: BackendKind,
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    /// Creates a mock posing as `kind`.
    pub fn new(kind: BackendKind) -> Self {
        MockDriver {
            kind,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Returns a factory handing out clones of this mock.
    ///
    /// Each invocation counts as one hardware initialization.
    pub fn factory(&self) -> DriverFactory {
        let mock = self.clone();
        Box::new(move |_config: &NetworkConfig| {
            mock.state.lock().init_count += 1;
            Ok(Box::new(mock.clone()) as Box<dyn Driver>)
        })
    }

    /// Registers this mock's factory under its kind.
    pub fn register(&self, registry: &mut BackendRegistry) {
        registry.register(self.kind, self.factory());
    }

    /// Queues the link events reported by one future `idle` call.
    ///
    /// Ticks past the end of the script report nothing.
    pub fn script_tick(&self, events: impl IntoIterator<Item = LinkEvent>) {
        self.state
            .lock()
            .idle_script
            .push_back(events.into_iter().collect());
    }

    /// Queues `count` ticks that report nothing.
    pub fn script_quiet_ticks(&self, count: usize) {
        let mut state = self.state.lock();
        for _ in 0..count {
            state.idle_script.push_back(Vec::new());
        }
    }

    /// Sets the result of every later `check_error` call.
    pub fn set_healthy(&self, healthy: bool) {
        self.state.lock().healthy = healthy;
    }

    /// Sets the declared fault scope.
    pub fn set_fault_scope(&self, scope: FaultScope) {
        self.state.lock().fault_scope = scope;
    }

    /// Simulates an incoming connection from an unknown peer.
    pub fn inject_connection(&self, server: SocketId) {
        self.state
            .lock()
            .pending
            .entry(server)
            .or_default()
            .push_back(None);
    }

    /// Simulates an incoming connection from `peer`.
    pub fn inject_connection_from(&self, server: SocketId, peer: SocketAddrV4) {
        self.state
            .lock()
            .pending
            .entry(server)
            .or_default()
            .push_back(Some(peer));
    }

    /// Queues the outcome of the next `recv` on `socket`.
    pub fn queue_recv(&self, socket: SocketId, outcome: MockRecv) {
        self.state
            .lock()
            .recv_script
            .entry(socket)
            .or_default()
            .push_back(outcome);
    }

    /// Queues the outcome of the next `send` on `socket`.
    pub fn queue_send(&self, socket: SocketId, outcome: MockSend) {
        self.state
            .lock()
            .send_script
            .entry(socket)
            .or_default()
            .push_back(outcome);
    }

    /// Makes `name` resolvable.
    pub fn add_host(&self, name: &str, addr: Ipv4Addr) {
        self.state.lock().hosts.insert(name.to_string(), addr);
    }

    /// Fails the next `create_socket` with `error`.
    pub fn fail_next_create(&self, error: NetworkError) {
        self.state.lock().create_error = Some(error);
    }

    /// Bytes accepted by `send` on `socket`.
    pub fn sent(&self, socket: SocketId) -> Vec<u8> {
        self.state
            .lock()
            .sent
            .get(&socket)
            .cloned()
            .unwrap_or_default()
    }

    /// Descriptors closed so far, in order.
    pub fn closed(&self) -> Vec<SocketId> {
        self.state.lock().closed.clone()
    }

    /// Returns true if `socket` is open on the mock.
    pub fn is_open(&self, socket: SocketId) -> bool {
        self.state.lock().open.contains(&socket)
    }

    /// `(host, port)` of every successful `create_socket`.
    pub fn created(&self) -> Vec<(Ipv4Addr, u16)> {
        self.state.lock().created.clone()
    }

    /// Number of times the factory built a driver.
    pub fn init_count(&self) -> usize {
        self.state.lock().init_count
    }

    /// Number of `idle` calls.
    pub fn idle_calls(&self) -> usize {
        self.state.lock().idle_calls
    }

    /// Number of `check_error` calls.
    pub fn check_error_calls(&self) -> usize {
        self.state.lock().check_error_calls
    }

    /// Number of `resolve_hostname` calls.
    pub fn resolve_calls(&self) -> usize {
        self.state.lock().resolve_calls
    }
}

impl Driver for MockDriver {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn idle(&mut self, link: &mut LinkReporter) {
        let mut state = self.state.lock();
        state.idle_calls += 1;
        if let Some(events) = state.idle_script.pop_front() {
            for event in events {
                link.report(event);
            }
        }
    }

    fn check_error(&mut self) -> bool {
        let mut state = self.state.lock();
        state.check_error_calls += 1;
        state.healthy
    }

    fn fault_scope(&self) -> FaultScope {
        self.state.lock().fault_scope
    }

    fn create_socket(&mut self, host: Ipv4Addr, port: u16) -> NetworkResult<SocketId> {
        let mut state = self.state.lock();
        if let Some(err) = state.create_error.take() {
            return Err(err);
        }
        let id = SocketId(state.next_id);
        state.next_id += 1;
        state.open.insert(id);
        if host.is_unspecified() {
            state.listeners.insert(id, port);
        } else {
            state.peers.insert(id, SocketAddrV4::new(host, port));
        }
        state.created.push((host, port));
        Ok(id)
    }

    fn close_socket(&mut self, socket: SocketId) {
        let mut state = self.state.lock();
        if state.open.remove(&socket) {
            state.listeners.remove(&socket);
            state.pending.remove(&socket);
            state.peers.remove(&socket);
            state.closed.push(socket);
        }
    }

    fn accept(&mut self, server: SocketId) -> NetworkResult<Option<SocketId>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if !state.listeners.contains_key(&server) {
            return Err(NetworkError::Transport(format!(
                "{server} is not a listening socket"
            )));
        }
        let Some(peer) = state.pending.get_mut(&server).and_then(VecDeque::pop_front) else {
            return Ok(None);
        };
        let id = SocketId(state.next_id);
        state.next_id += 1;
        state.open.insert(id);
        if let Some(peer) = peer {
            state.peers.insert(id, peer);
        }
        Ok(Some(id))
    }

    fn resolve_hostname(&mut self, name: &str) -> NetworkResult<Ipv4Addr> {
        let mut state = self.state.lock();
        state.resolve_calls += 1;
        state
            .hosts
            .get(name)
            .copied()
            .ok_or_else(|| NetworkError::ResolutionFailed(name.to_string()))
    }

    fn recv(&mut self, socket: SocketId, buf: &mut [u8]) -> NetworkResult<usize> {
        let mut state = self.state.lock();
        if !state.open.contains(&socket) {
            return Err(NetworkError::Transport(format!("{socket} is not open")));
        }
        let script = state.recv_script.entry(socket).or_default();
        match script.pop_front() {
            Some(MockRecv::Data(data)) => {
                let read = data.len().min(buf.len());
                buf[..read].copy_from_slice(&data[..read]);
                if read < data.len() {
                    script.push_front(MockRecv::Data(data[read..].to_vec()));
                }
                Ok(read)
            }
            Some(MockRecv::Fail) => Err(NetworkError::Transport("mock recv failure".into())),
            Some(MockRecv::Empty) | None => Ok(0),
        }
    }

    fn send(&mut self, socket: SocketId, buf: &[u8]) -> NetworkResult<usize> {
        let mut state = self.state.lock();
        if !state.open.contains(&socket) {
            return Err(NetworkError::Transport(format!("{socket} is not open")));
        }
        let outcome = state
            .send_script
            .get_mut(&socket)
            .and_then(VecDeque::pop_front)
            .unwrap_or(MockSend::Accept);
        match outcome {
            MockSend::Accept => {
                state.sent.entry(socket).or_default().extend_from_slice(buf);
                Ok(buf.len())
            }
            MockSend::Busy => Ok(0),
            MockSend::Fail => Err(NetworkError::Transport("mock send failure".into())),
        }
    }

    fn local_addr(&self, socket: SocketId) -> Option<SocketAddrV4> {
        self.state
            .lock()
            .listeners
            .get(&socket)
            .map(|port| SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, *port))
    }

    fn peer_addr(&self, socket: SocketId) -> Option<SocketAddrV4> {
        self.state.lock().peers.get(&socket).copied()
    }
}
