// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network Subsystem
//!
//! Single owner of the bound handle, the connectivity state and the socket
//! table. Selection and binding live here; socket operations are in
//! `lifecycle.rs` and the idle tick in `recovery.rs`.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::config::{BackendKind, NetworkConfig};
use super::error::{NetworkError, NetworkResult};
use super::events::{EventDispatcher, EventHandler, NetworkEvent};
use super::handle::{HandleId, NetworkHandle};
use super::registry::BackendRegistry;
use super::socket::{Socket, SocketTable};
use super::state::ConnectivityState;
use super::store::ConfigStore;

/// Process-wide network subsystem.
///
/// Everything runs on the host's cooperative scheduler thread. Each method
/// takes `&mut self`, so a driver can never call back into the subsystem
/// while one of its own operations is running.
///
/// # Example
///
/// ```ignore
/// use nethal::network::{
///     BackendKind, MemoryConfigStore, NetworkConfig, NetworkSubsystem,
/// };
///
/// let store = MemoryConfigStore::with_config(NetworkConfig::new(BackendKind::HostSocket));
/// let mut net = NetworkSubsystem::new(store);
/// net.bind_active()?;
///
/// // Scheduler tick
/// net.idle();
/// let server = net.listen(8080)?;
/// if let Some(client) = net.accept(server)? {
///     net.send(client, b"hello")?;
/// }
/// ```
pub struct NetworkSubsystem {
    store: Box<dyn ConfigStore>,
    registry: BackendRegistry,
    pub(super) handle: Option<NetworkHandle>,
    pub(super) state: ConnectivityState,
    pub(super) sockets: SocketTable,
    events: EventDispatcher,
    last_epoch: u64,
    pub(super) ticks: u64,
}

impl NetworkSubsystem {
    /// Creates a subsystem using the backends compiled into this build.
    pub fn new(store: impl ConfigStore + 'static) -> Self {
        Self::with_registry(store, BackendRegistry::compiled())
    }

    /// Creates a subsystem with an explicit backend registry.
    pub fn with_registry(store: impl ConfigStore + 'static, registry: BackendRegistry) -> Self {
        NetworkSubsystem {
            store: Box::new(store),
            registry,
            handle: None,
            state: ConnectivityState::Offline,
            sockets: SocketTable::new(),
            events: EventDispatcher::new(),
            last_epoch: 0,
            ticks: 0,
        }
    }

    /// Adds an event handler.
    pub fn add_event_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.events.add_handler(handler);
    }

    /// Removes a previously added event handler.
    ///
    /// Handlers are matched by identity. Returns false if `handler` was not
    /// registered.
    pub fn remove_event_handler(&mut self, handler: &Arc<dyn EventHandler>) -> bool {
        self.events.remove_handler(handler)
    }

    /// Returns the current connectivity state.
    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    /// Returns true if a handle is bound.
    pub fn is_bound(&self) -> bool {
        self.handle.is_some()
    }

    /// Returns the bound handle, if any.
    pub fn handle(&self) -> Option<&NetworkHandle> {
        self.handle.as_ref()
    }

    /// Returns the kind of the bound backend, if any.
    pub fn active_kind(&self) -> Option<BackendKind> {
        self.handle.as_ref().map(NetworkHandle::kind)
    }

    /// Returns the backend registry.
    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Returns the number of idle ticks run against a bound handle.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Binds the configured backend, reusing the cached handle when the
    /// persisted configuration is unchanged.
    ///
    /// A cached handle whose configuration no longer matches the store is
    /// released and rebuilt.
    pub fn bind_active(&mut self) -> NetworkResult<&NetworkHandle> {
        let config = self
            .store
            .load()?
            .ok_or(NetworkError::ConfigurationMissing)?;

        let reuse = self
            .handle
            .as_ref()
            .is_some_and(|handle| handle.config() == &config);
        if reuse {
            return self.handle.as_ref().ok_or(NetworkError::NotConfigured);
        }

        if !self.registry.supports(config.backend) {
            warn!(backend = %config.backend, "backend not compiled into this build");
            return Err(NetworkError::UnsupportedBackend(config.backend));
        }

        if self.handle.is_some() {
            info!("network configuration changed, rebinding");
            self.unbind();
        }

        let driver = self.registry.create(&config)?;
        self.last_epoch += 1;
        let handle = NetworkHandle::new(config, driver, self.last_epoch);
        let id = handle.id();
        self.sockets.reset(id.epoch);

        info!(backend = %id.kind, epoch = id.epoch, "network backend bound");
        self.events.dispatch(NetworkEvent::Bound { handle: id });

        let handle = self.handle.insert(handle);
        Ok(&*handle)
    }

    /// Releases the bound handle and forces the state to Offline.
    ///
    /// Every outstanding socket is closed on the backend and reported as
    /// invalidated. Safe to call when nothing is bound.
    pub fn unbind(&mut self) {
        let Some(mut handle) = self.handle.take() else {
            return;
        };

        let sockets = self.sockets.reset(0);
        for socket in &sockets {
            handle.driver_mut().close_socket(socket.id());
        }
        for socket in sockets {
            debug!(%socket, "socket invalidated by unbind");
            self.events
                .dispatch(NetworkEvent::SocketInvalidated { socket });
        }

        self.transition(ConnectivityState::Offline);

        let kind = handle.kind();
        drop(handle);
        info!(backend = %kind, "network backend unbound");
        self.events.dispatch(NetworkEvent::Unbound { kind });
    }

    /// Persists a new configuration and rebinds from it.
    pub fn reconfigure(&mut self, config: NetworkConfig) -> NetworkResult<HandleId> {
        self.store.save(&config)?;
        self.unbind();
        self.bind_active().map(NetworkHandle::id)
    }

    /// Moves the state machine to `to`, emitting events.
    ///
    /// Entering Offline invalidates every open socket.
    pub(super) fn transition(&mut self, to: ConnectivityState) {
        let from = self.state;
        if from == to {
            return;
        }
        debug_assert!(from.can_transition_to(to), "{from} -> {to}");

        self.state = to;
        info!(%from, %to, "connectivity changed");
        self.events
            .dispatch(NetworkEvent::StateChanged { from, to });

        if to == ConnectivityState::Offline {
            for socket in self.sockets.invalidate_all() {
                debug!(%socket, "socket invalidated by link loss");
                self.events
                    .dispatch(NetworkEvent::SocketInvalidated { socket });
            }
        }
    }

    /// Error for an operation on `socket` while nothing is bound.
    ///
    /// Descriptors issued by an earlier binding are invalidated; anything
    /// else means the subsystem was never configured.
    pub(super) fn unbound_error(&self, socket: Socket) -> NetworkError {
        let epoch = socket.epoch();
        if epoch != 0 && epoch <= self.last_epoch {
            NetworkError::SocketInvalidated
        } else {
            NetworkError::NotConfigured
        }
    }

    pub(super) fn has_event_handlers(&self) -> bool {
        !self.events.is_empty()
    }

    pub(super) fn dispatch(&self, event: NetworkEvent) {
        self.events.dispatch(event);
    }
}
