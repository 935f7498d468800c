// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Idle / Recovery Loop

use tracing::{trace, warn};

use super::driver::LinkReporter;
use super::state::{ConnectivityState, LinkEvent};
use super::subsystem::NetworkSubsystem;

impl NetworkSubsystem {
    /// Runs one scheduler tick against the bound backend.
    ///
    /// 1. `idle()` lets the backend progress; reported link events are
    ///    applied in order.
    /// 2. `check_error()`; an unrecovered fault demotes the state by the
    ///    backend's declared fault scope.
    /// 3. Entering Offline invalidates (but does not close) open sockets.
    ///
    /// Must run before any socket operation of the same tick so demotions
    /// are visible to it. Does nothing when no handle is bound.
    pub fn idle(&mut self) -> ConnectivityState {
        let events = match self.handle.as_mut() {
            Some(handle) => {
                let mut link = LinkReporter::new();
                handle.driver_mut().idle(&mut link);
                link.take()
            }
            None => return self.state,
        };
        self.ticks += 1;
        trace!(tick = self.ticks, events = events.len(), "network idle");

        for event in events {
            self.apply_link_event(event);
        }

        let (healthy, scope) = match self.handle.as_mut() {
            Some(handle) => {
                let driver = handle.driver_mut();
                (driver.check_error(), driver.fault_scope())
            }
            None => return self.state,
        };
        if !healthy {
            warn!(state = %self.state, ?scope, "backend fault not recovered");
            if let Some(next) = self.state.demote(scope) {
                self.transition(next);
            }
        }

        self.state
    }

    fn apply_link_event(&mut self, event: LinkEvent) {
        match self.state.apply(event) {
            Some(next) => self.transition(next),
            None if event == LinkEvent::AddressAcquired
                && self.state == ConnectivityState::Offline =>
            {
                warn!(state = %self.state, "address reported without a link, ignored");
            }
            None => trace!(state = %self.state, ?event, "link event ignored"),
        }
    }
}
