// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Shared Test Helpers
//!
//! Subsystem fixtures wired to a `MockDriver`, plus an event recorder.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;

use nethal::network::*;

/// Records every dispatched event.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<NetworkEvent>>,
}

impl EventLog {
    pub fn events(&self) -> Vec<NetworkEvent> {
        self.events.lock().clone()
    }

    pub fn state_changes(&self) -> Vec<(ConnectivityState, ConnectivityState)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                NetworkEvent::StateChanged { from, to } => Some((from, to)),
                _ => None,
            })
            .collect()
    }

    pub fn invalidated(&self) -> Vec<Socket> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                NetworkEvent::SocketInvalidated { socket } => Some(socket),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventHandler for EventLog {
    fn on_event(&self, event: NetworkEvent) {
        self.events.lock().push(event);
    }
}

/// Subsystem whose registry holds only `mock`, configured for its kind.
pub fn subsystem_with(mock: &MockDriver, kind: BackendKind) -> NetworkSubsystem {
    let mut registry = BackendRegistry::empty();
    mock.register(&mut registry);
    let store = MemoryConfigStore::with_config(NetworkConfig::new(kind));
    NetworkSubsystem::with_registry(store, registry)
}

/// Bound mock subsystem posing as the host socket backend.
pub fn bound_mock() -> (NetworkSubsystem, MockDriver, Arc<EventLog>) {
    let mock = MockDriver::new(BackendKind::HostSocket);
    let mut net = subsystem_with(&mock, BackendKind::HostSocket);
    let log = Arc::new(EventLog::default());
    net.add_event_handler(log.clone());
    net.bind_active().expect("mock backend binds");
    (net, mock, log)
}

/// Bound mock subsystem driven to Online in two ticks.
pub fn online_mock() -> (NetworkSubsystem, MockDriver, Arc<EventLog>) {
    let (mut net, mock, log) = bound_mock();
    mock.script_tick([LinkEvent::LinkUp]);
    mock.script_tick([LinkEvent::AddressAcquired]);
    net.idle();
    net.idle();
    assert_eq!(net.state(), ConnectivityState::Online);
    (net, mock, log)
}
