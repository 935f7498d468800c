// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Connectivity State
//!
//! Tri-state link/address machine shared by every backend.
//!
//! ```text
//!  Offline <--> Connected <--> Online
//!     ^                          |
//!     +--------- link lost ------+
//! ```
//!
//! `Offline -> Online` is never taken: a backend that acquires an address
//! must first report the link coming up.

use std::fmt;

/// Process-wide connectivity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectivityState {
    /// No link.
    #[default]
    Offline,
    /// Link established but no usable address yet (e.g. DHCP pending).
    Connected,
    /// Link live and address acquired.
    Online,
}

impl ConnectivityState {
    /// Returns true if the state allows routable operations.
    pub fn is_online(self) -> bool {
        self == ConnectivityState::Online
    }

    /// Returns true if a link is present (Connected or Online).
    pub fn has_link(self) -> bool {
        self != ConnectivityState::Offline
    }

    /// Returns true if `self -> next` is an edge of the state machine.
    pub fn can_transition_to(self, next: ConnectivityState) -> bool {
        use ConnectivityState::*;
        matches!(
            (self, next),
            (Offline, Connected)
                | (Connected, Online)
                | (Online, Connected)
                | (Connected, Offline)
                | (Online, Offline)
        )
    }

    /// Applies a backend-reported link event.
    ///
    /// Returns the new state when the event moves the machine along an edge,
    /// `None` when it leaves the state unchanged.
    pub fn apply(self, event: LinkEvent) -> Option<ConnectivityState> {
        use ConnectivityState::*;
        match (self, event) {
            (Offline, LinkEvent::LinkUp) => Some(Connected),
            (Connected, LinkEvent::AddressAcquired) => Some(Online),
            (Online, LinkEvent::AddressLost) => Some(Connected),
            (Connected | Online, LinkEvent::LinkDown) => Some(Offline),
            _ => None,
        }
    }

    /// Target state when a fault of the given scope is left unrecovered.
    pub fn demote(self, scope: FaultScope) -> Option<ConnectivityState> {
        use ConnectivityState::*;
        match (self, scope) {
            (Online, FaultScope::Addressing) => Some(Connected),
            (Connected | Online, FaultScope::Link) => Some(Offline),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectivityState::Offline => "offline",
            ConnectivityState::Connected => "connected",
            ConnectivityState::Online => "online",
        };
        f.write_str(name)
    }
}

/// Link progress reported by a backend from `idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkEvent {
    /// Physical link or association established.
    LinkUp,
    /// A routable address was obtained.
    AddressAcquired,
    /// The address (lease) was lost but the link remains.
    AddressLost,
    /// The link itself went down.
    LinkDown,
}

/// Granularity of an unrecovered fault, declared by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FaultScope {
    /// Only addressing is affected; demote Online to Connected.
    Addressing,
    /// The link is gone; demote to Offline.
    #[default]
    Link,
}
