// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for network::lifecycle
//! Socket create/accept/send/recv/close through the subsystem.

mod support;

use std::net::{Ipv4Addr, SocketAddrV4};

use nethal::network::*;
use support::{bound_mock, online_mock, subsystem_with};

const PEER: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 20);

#[test]
fn test_operations_without_binding_fail_not_configured() {
    let mock = MockDriver::new(BackendKind::HostSocket);
    let mut net = subsystem_with(&mock, BackendKind::HostSocket);
    let mut buf = [0u8; 4];

    assert_eq!(net.listen(80).err(), Some(NetworkError::NotConfigured));
    assert_eq!(net.connect(PEER, 80).err(), Some(NetworkError::NotConfigured));
    assert_eq!(
        net.resolve_hostname("example.com").err(),
        Some(NetworkError::NotConfigured)
    );

    // Borrow a descriptor from a bound subsystem to use against the unbound one.
    let (mut other, _other_mock, _log) = online_mock();
    let socket = other.listen(80).unwrap();
    assert_eq!(net.recv(socket, &mut buf).err(), Some(NetworkError::NotConfigured));
    assert_eq!(net.send(socket, b"x").err(), Some(NetworkError::NotConfigured));
    assert_eq!(net.accept(socket).err(), Some(NetworkError::NotConfigured));

    // Cleanup is always permitted.
    net.close_socket(socket);
    assert!(mock.created().is_empty());
}

#[test]
fn test_server_scenario_accept_none_then_injected_connection() {
    let (mut net, mock, _log) = bound_mock();

    let server = net.create_socket(Ipv4Addr::UNSPECIFIED, 8080).unwrap();
    assert!(server.id().0 < u32::MAX);
    assert_eq!(mock.created(), vec![(Ipv4Addr::UNSPECIFIED, 8080)]);

    assert_eq!(net.accept(server).unwrap(), None);

    mock.inject_connection(server.id());
    let client = net.accept(server).unwrap().expect("pending connection");
    assert_ne!(client.id(), server.id());

    let info = net.socket_info(client).unwrap();
    assert_eq!(info.role, SocketRole::Client);
    assert_eq!(info.state, SocketState::Open);

    let info = net.socket_info(server).unwrap();
    assert_eq!(info.role, SocketRole::Server);
    assert_eq!(
        info.local.map(|addr| addr.port()),
        Some(8080)
    );

    assert_eq!(net.accept(server).unwrap(), None);
}

#[test]
fn test_accepted_socket_records_peer() {
    let (mut net, mock, _log) = bound_mock();
    let server = net.listen(8080).unwrap();
    let remote = SocketAddrV4::new(PEER, 50_123);

    mock.inject_connection_from(server.id(), remote);
    let client = net.accept(server).unwrap().expect("pending connection");

    assert_eq!(net.socket_info(client).unwrap().peer, Some(remote));
}

#[test]
fn test_descriptors_invalidated_after_unbind_without_rebind() {
    let (mut net, _mock, _log) = online_mock();
    let client = net.connect(PEER, 80).unwrap();
    let server = net.listen(8080).unwrap();

    net.unbind();
    assert!(!net.is_bound());

    let mut buf = [0u8; 4];
    assert_eq!(
        net.recv(client, &mut buf).err(),
        Some(NetworkError::SocketInvalidated)
    );
    assert_eq!(net.send(client, b"x").err(), Some(NetworkError::SocketInvalidated));
    assert_eq!(net.accept(server).err(), Some(NetworkError::SocketInvalidated));
    assert_eq!(
        net.socket_info(client).err(),
        Some(NetworkError::SocketInvalidated)
    );

    // Operations that do not name a descriptor still report the missing binding.
    assert_eq!(net.connect(PEER, 80).err(), Some(NetworkError::NotConfigured));
    assert_eq!(net.listen(80).err(), Some(NetworkError::NotConfigured));
    assert_eq!(
        net.resolve_hostname("device.local").err(),
        Some(NetworkError::NotConfigured)
    );

    // Cleanup is still allowed.
    net.close_socket(client);
}

#[test]
fn test_server_socket_allowed_before_online() {
    let (mut net, _mock, _log) = bound_mock();
    assert_eq!(net.state(), ConnectivityState::Offline);

    assert!(net.listen(80).is_ok());
}

#[test]
fn test_client_socket_requires_online() {
    let (mut net, mock, _log) = bound_mock();

    assert_eq!(
        net.connect(PEER, 80).err(),
        Some(NetworkError::NotOnline(ConnectivityState::Offline))
    );

    mock.script_tick([LinkEvent::LinkUp]);
    net.idle();
    assert_eq!(
        net.connect(PEER, 80).err(),
        Some(NetworkError::NotOnline(ConnectivityState::Connected))
    );
    assert!(mock.created().is_empty());

    mock.script_tick([LinkEvent::AddressAcquired]);
    net.idle();
    let client = net.connect(PEER, 80).unwrap();
    let info = net.socket_info(client).unwrap();
    assert_eq!(info.peer.map(|p| *p.ip()), Some(PEER));
    assert_eq!(info.role, SocketRole::Client);
}

#[test]
fn test_connect_to_unspecified_is_rejected() {
    let (mut net, _mock, _log) = online_mock();
    assert!(matches!(
        net.connect(Ipv4Addr::UNSPECIFIED, 80),
        Err(NetworkError::InvalidOperation(_))
    ));
}

#[test]
fn test_create_failure_propagates_without_tracking() {
    let (mut net, mock, _log) = online_mock();
    mock.fail_next_create(NetworkError::Transport("no free sockets".into()));

    assert_eq!(
        net.connect(PEER, 80).err(),
        Some(NetworkError::Transport("no free sockets".into()))
    );
    assert_eq!(net.open_socket_count(), 0);
}

#[test]
fn test_resolve_hostname() {
    let (mut net, mock, _log) = online_mock();
    mock.add_host("device.local", PEER);

    assert_eq!(net.resolve_hostname("device.local").unwrap(), PEER);
    assert_eq!(
        net.resolve_hostname("missing.local").err(),
        Some(NetworkError::ResolutionFailed("missing.local".into()))
    );
    assert_eq!(mock.resolve_calls(), 2);
}

#[test]
fn test_resolve_ip_literal_skips_backend() {
    let (mut net, mock, _log) = online_mock();

    assert_eq!(
        net.resolve_hostname(" 10.1.2.3 ").unwrap(),
        Ipv4Addr::new(10, 1, 2, 3)
    );
    assert!(matches!(
        net.resolve_hostname("   "),
        Err(NetworkError::ResolutionFailed(_))
    ));
    assert_eq!(mock.resolve_calls(), 0);
}

#[test]
fn test_resolve_requires_online() {
    let (mut net, mock, _log) = bound_mock();
    mock.add_host("device.local", PEER);

    assert_eq!(
        net.resolve_hostname("device.local").err(),
        Some(NetworkError::NotOnline(ConnectivityState::Offline))
    );
    assert_eq!(mock.resolve_calls(), 0);
}

#[test]
fn test_recv_zero_is_not_end_of_stream() {
    let (mut net, mock, _log) = online_mock();
    let socket = net.connect(PEER, 80).unwrap();
    let mut buf = [0u8; 16];

    assert_eq!(net.recv(socket, &mut buf).unwrap(), 0);

    mock.queue_recv(socket.id(), MockRecv::Data(b"hello".to_vec()));
    assert_eq!(net.recv(socket, &mut buf).unwrap(), 5);
    assert_eq!(&buf[..5], b"hello");

    assert_eq!(net.recv(socket, &mut buf).unwrap(), 0);
    assert_eq!(net.socket_info(socket).unwrap().state, SocketState::Open);
}

#[test]
fn test_recv_partial_reads_keep_remainder() {
    let (mut net, mock, _log) = online_mock();
    let socket = net.connect(PEER, 80).unwrap();
    mock.queue_recv(socket.id(), MockRecv::Data(b"abcdef".to_vec()));

    let mut buf = [0u8; 4];
    assert_eq!(net.recv(socket, &mut buf).unwrap(), 4);
    assert_eq!(&buf, b"abcd");
    assert_eq!(net.recv(socket, &mut buf).unwrap(), 2);
    assert_eq!(&buf[..2], b"ef");
}

#[test]
fn test_send_zero_then_error_closes_socket() {
    let (mut net, mock, log) = online_mock();
    let socket = net.connect(PEER, 80).unwrap();

    mock.queue_send(socket.id(), MockSend::Busy);
    mock.queue_send(socket.id(), MockSend::Accept);
    mock.queue_send(socket.id(), MockSend::Busy);
    mock.queue_send(socket.id(), MockSend::Fail);

    // Busy: caller keeps the socket and retries on a later tick.
    assert_eq!(net.send(socket, b"ping").unwrap(), 0);
    assert_eq!(net.send(socket, b"ping").unwrap(), 4);
    assert_eq!(net.send(socket, b"pong").unwrap(), 0);
    assert_eq!(mock.sent(socket.id()), b"ping".to_vec());

    // Error: the socket is closed and later use is rejected.
    assert!(matches!(
        net.send(socket, b"pong"),
        Err(NetworkError::Transport(_))
    ));
    assert_eq!(mock.closed(), vec![socket.id()]);
    assert_eq!(net.send(socket, b"x").err(), Some(NetworkError::SocketClosed));
    assert!(log.events().iter().any(|event| matches!(
        event,
        NetworkEvent::SocketClosed { socket: s, .. } if *s == socket
    )));
}

#[test]
fn test_recv_alternating_empty_and_failure() {
    let (mut net, mock, _log) = online_mock();
    let socket = net.connect(PEER, 80).unwrap();
    mock.queue_recv(socket.id(), MockRecv::Empty);
    mock.queue_recv(socket.id(), MockRecv::Fail);

    let mut buf = [0u8; 8];
    assert_eq!(net.recv(socket, &mut buf).unwrap(), 0);
    let err = net.recv(socket, &mut buf).unwrap_err();
    assert!(err.requires_close());
    assert!(!mock.is_open(socket.id()));
    assert_eq!(net.open_socket_count(), 0);
    assert_eq!(
        net.recv(socket, &mut buf).err(),
        Some(NetworkError::SocketClosed)
    );
}

#[test]
fn test_close_is_idempotent() {
    let (mut net, mock, _log) = online_mock();
    let socket = net.connect(PEER, 80).unwrap();

    net.close_socket(socket);
    net.close_socket(socket);

    assert_eq!(mock.closed(), vec![socket.id()]);
    assert!(net.sockets().is_empty());
    assert_eq!(net.socket_info(socket).err(), Some(NetworkError::SocketClosed));
}

#[test]
fn test_accept_on_client_socket_is_invalid() {
    let (mut net, _mock, _log) = online_mock();
    let client = net.connect(PEER, 80).unwrap();

    assert!(matches!(
        net.accept(client),
        Err(NetworkError::InvalidOperation(_))
    ));
}

#[test]
fn test_sockets_snapshot() {
    let (mut net, _mock, _log) = online_mock();
    let server = net.listen(80).unwrap();
    let client = net.connect(PEER, 443).unwrap();

    let sockets: Vec<Socket> = net.sockets().into_iter().map(|info| info.socket).collect();
    assert_eq!(sockets, vec![server, client]);
    assert_eq!(net.open_socket_count(), 2);
}
