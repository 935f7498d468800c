// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for network::recovery
//! Idle ticks, link progression and fault demotion.

mod support;

use std::net::Ipv4Addr;

use nethal::network::*;
use support::{bound_mock, online_mock, subsystem_with};

use nethal::network::ConnectivityState::{Connected, Offline, Online};

const PEER: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);

#[test]
fn test_idle_without_binding_is_noop() {
    let mock = MockDriver::new(BackendKind::HostSocket);
    let mut net = subsystem_with(&mock, BackendKind::HostSocket);
    mock.script_tick([LinkEvent::LinkUp]);

    assert_eq!(net.idle(), Offline);
    assert_eq!(net.ticks(), 0);
    assert_eq!(mock.idle_calls(), 0);
}

#[test]
fn test_online_reached_on_third_tick() {
    let (mut net, mock, log) = bound_mock();
    mock.script_quiet_ticks(1);
    mock.script_tick([LinkEvent::LinkUp]);
    mock.script_tick([LinkEvent::AddressAcquired]);

    assert_eq!(net.idle(), Offline);
    assert_eq!(net.idle(), Connected);
    assert_eq!(net.idle(), Online);
    assert_eq!(net.ticks(), 3);

    assert_eq!(log.state_changes(), vec![(Offline, Connected), (Connected, Online)]);

    let client = net.connect(PEER, 80);
    assert!(client.is_ok());
}

#[test]
fn test_both_events_in_one_tick_pass_through_connected() {
    let (mut net, mock, log) = bound_mock();
    mock.script_tick([LinkEvent::LinkUp, LinkEvent::AddressAcquired]);

    assert_eq!(net.idle(), Online);
    assert_eq!(log.state_changes(), vec![(Offline, Connected), (Connected, Online)]);
}

#[test]
fn test_address_without_link_is_ignored() {
    let (mut net, mock, log) = bound_mock();
    mock.script_tick([LinkEvent::AddressAcquired]);

    assert_eq!(net.idle(), Offline);
    assert!(log.state_changes().is_empty());
}

#[test]
fn test_check_error_runs_after_idle_every_tick() {
    let (mut net, mock, _log) = bound_mock();
    for _ in 0..5 {
        net.idle();
    }
    assert_eq!(mock.idle_calls(), 5);
    assert_eq!(mock.check_error_calls(), 5);
}

#[test]
fn test_addressing_fault_demotes_to_connected() {
    let (mut net, mock, log) = online_mock();
    let server = net.listen(80).unwrap();
    log.clear();

    mock.set_fault_scope(FaultScope::Addressing);
    mock.set_healthy(false);

    assert_eq!(net.idle(), Connected);
    assert_eq!(log.state_changes(), vec![(Online, Connected)]);
    assert_eq!(
        net.connect(PEER, 80).err(),
        Some(NetworkError::NotOnline(Connected))
    );
    assert_eq!(
        net.resolve_hostname("device.local").err(),
        Some(NetworkError::NotOnline(Connected))
    );

    // Sockets survive an addressing fault.
    assert_eq!(net.accept(server).unwrap(), None);
    assert!(log.invalidated().is_empty());

    // Still faulted: nothing further to demote to.
    assert_eq!(net.idle(), Connected);
    assert_eq!(log.state_changes().len(), 1);
}

#[test]
fn test_link_fault_demotes_to_offline_and_invalidates_sockets() {
    let (mut net, mock, log) = online_mock();
    let server = net.listen(80).unwrap();
    let client = net.connect(PEER, 80).unwrap();
    log.clear();

    mock.set_healthy(false);
    assert_eq!(net.idle(), Offline);
    assert_eq!(log.state_changes(), vec![(Online, Offline)]);
    assert_eq!(log.invalidated(), vec![server, client]);

    // Invalidated, not closed.
    assert!(mock.closed().is_empty());
    assert_eq!(net.open_socket_count(), 0);
    assert_eq!(
        net.socket_info(client).unwrap().state,
        SocketState::Invalidated
    );

    let mut buf = [0u8; 4];
    assert_eq!(net.recv(client, &mut buf).err(), Some(NetworkError::SocketInvalidated));
    assert_eq!(net.send(client, b"x").err(), Some(NetworkError::SocketInvalidated));
    assert_eq!(net.accept(server).err(), Some(NetworkError::SocketInvalidated));

    // Cleanup still reaches the backend.
    net.close_socket(client);
    net.close_socket(server);
    assert_eq!(mock.closed(), vec![client.id(), server.id()]);
    assert!(net.sockets().is_empty());
}

#[test]
fn test_link_down_event_invalidates_sockets() {
    let (mut net, mock, log) = online_mock();
    let client = net.connect(PEER, 80).unwrap();

    mock.script_tick([LinkEvent::LinkDown]);
    assert_eq!(net.idle(), Offline);
    assert_eq!(log.invalidated(), vec![client]);
}

#[test]
fn test_address_lost_keeps_sockets() {
    let (mut net, mock, log) = online_mock();
    let client = net.connect(PEER, 80).unwrap();

    mock.script_tick([LinkEvent::AddressLost]);
    assert_eq!(net.idle(), Connected);
    assert!(log.invalidated().is_empty());
    assert_eq!(net.send(client, b"x").unwrap(), 1);
}

#[test]
fn test_recovery_after_link_fault() {
    let (mut net, mock, log) = online_mock();
    mock.set_healthy(false);
    net.idle();
    assert_eq!(net.state(), Offline);

    mock.set_healthy(true);
    mock.script_tick([LinkEvent::LinkUp]);
    mock.script_tick([LinkEvent::AddressAcquired]);
    net.idle();
    net.idle();

    assert_eq!(net.state(), Online);
    assert_eq!(
        log.state_changes(),
        vec![
            (Offline, Connected),
            (Connected, Online),
            (Online, Offline),
            (Offline, Connected),
            (Connected, Online),
        ]
    );
}

#[test]
fn test_fault_while_offline_emits_nothing() {
    let (mut net, mock, log) = bound_mock();
    mock.set_healthy(false);

    assert_eq!(net.idle(), Offline);
    assert!(log.state_changes().is_empty());
}

#[test]
fn test_link_event_and_fault_in_same_tick() {
    let (mut net, mock, log) = bound_mock();
    mock.script_tick([LinkEvent::LinkUp]);
    mock.set_healthy(false);

    // The link comes up during idle, then the fault takes it down again.
    assert_eq!(net.idle(), Offline);
    assert_eq!(log.state_changes(), vec![(Offline, Connected), (Connected, Offline)]);
}
