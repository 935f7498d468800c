// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Event System
//!
//! Notifications the host collaborator translates into interpreter-visible
//! events ("online", "disconnected", ...).

use std::sync::Arc;

use super::config::BackendKind;
use super::handle::HandleId;
use super::socket::Socket;
use super::state::ConnectivityState;

/// Events emitted by the network subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    /// A backend was bound.
    Bound {
        /// The new binding.
        handle: HandleId,
    },

    /// The active backend was released.
    Unbound {
        /// Kind of the released backend.
        kind: BackendKind,
    },

    /// Connectivity changed along one edge of the state machine.
    StateChanged {
        /// Previous state.
        from: ConnectivityState,
        /// New state.
        to: ConnectivityState,
    },

    /// A socket can no longer be used and must be discarded.
    SocketInvalidated {
        /// The affected descriptor.
        socket: Socket,
    },

    /// A socket was closed after a transport failure.
    SocketClosed {
        /// The affected descriptor.
        socket: Socket,
        /// Error description.
        reason: String,
    },
}

/// Event handler trait.
///
/// Implement this trait to receive network events.
pub trait EventHandler: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: NetworkEvent);
}

/// Simple callback-based event handler.
pub struct CallbackHandler<F>
where
    F: Fn(NetworkEvent) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackHandler<F>
where
    F: Fn(NetworkEvent) + Send + Sync,
{
    /// Creates a new callback handler.
    pub fn new(callback: F) -> Self {
        CallbackHandler { callback }
    }
}

impl<F> EventHandler for CallbackHandler<F>
where
    F: Fn(NetworkEvent) + Send + Sync,
{
    fn on_event(&self, event: NetworkEvent) {
        (self.callback)(event);
    }
}

/// Fans subsystem events out to the registered handlers.
#[derive(Default)]
pub(crate) struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub(crate) fn new() -> Self {
        EventDispatcher {
            handlers: Vec::new(),
        }
    }

    pub(crate) fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    /// Removes `handler`. Returns false if it was not registered.
    pub(crate) fn remove_handler(&mut self, handler: &Arc<dyn EventHandler>) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|h| !Arc::ptr_eq(h, handler));
        self.handlers.len() != before
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Delivers `event` to every handler, cloning only for all but the last.
    pub(crate) fn dispatch(&self, event: NetworkEvent) {
        let Some((last, rest)) = self.handlers.split_last() else {
            return;
        };
        for handler in rest {
            handler.on_event(event.clone());
        }
        last.on_event(event);
    }
}
