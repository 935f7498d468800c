// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network Transport Layer
//!
//! Hardware-agnostic network access for the embedded runtime. Upper layers
//! (socket and HTTP bindings) create and use connections without knowing
//! whether the medium is the host OS, a WiFi co-processor or an Ethernet
//! controller.
//!
//! # Architecture
//!
//! The network layer consists of:
//! - **Driver trait**: operation table each backend implements
//! - **Connectivity state**: Offline / Connected / Online
//! - **Selection & binding**: resolves the configured backend into a handle
//! - **Socket lifecycle**: gates and tracks every socket operation
//! - **Idle loop**: per-tick housekeeping and fault demotion
//!
//! # Example
//!
//! ```ignore
//! use nethal::network::{BackendKind, MemoryConfigStore, NetworkConfig, NetworkSubsystem};
//!
//! let store = MemoryConfigStore::with_config(NetworkConfig::new(BackendKind::HostSocket));
//! let mut net = NetworkSubsystem::new(store);
//! net.bind_active()?;
//!
//! loop {
//!     net.idle();
//!     // service sockets
//! }
//! ```

#[cfg(feature = "testing")]
pub mod config;
#[cfg(not(feature = "testing"))]
mod config;

#[cfg(feature = "testing")]
pub mod driver;
#[cfg(not(feature = "testing"))]
mod driver;

#[cfg(feature = "testing")]
pub mod error;
#[cfg(not(feature = "testing"))]
mod error;

#[cfg(feature = "testing")]
pub mod events;
#[cfg(not(feature = "testing"))]
mod events;

#[cfg(feature = "testing")]
pub mod handle;
#[cfg(not(feature = "testing"))]
mod handle;

#[cfg(all(feature = "host-socket", feature = "testing"))]
pub mod host_socket;
#[cfg(all(feature = "host-socket", not(feature = "testing")))]
mod host_socket;

mod lifecycle;

#[cfg(feature = "testing")]
pub mod mock;
#[cfg(not(feature = "testing"))]
mod mock;

mod recovery;

#[cfg(feature = "testing")]
pub mod registry;
#[cfg(not(feature = "testing"))]
mod registry;

#[cfg(feature = "testing")]
pub mod socket;
#[cfg(not(feature = "testing"))]
mod socket;

#[cfg(feature = "testing")]
pub mod state;
#[cfg(not(feature = "testing"))]
mod state;

#[cfg(feature = "testing")]
pub mod store;
#[cfg(not(feature = "testing"))]
mod store;

#[cfg(feature = "testing")]
pub mod subsystem;
#[cfg(not(feature = "testing"))]
mod subsystem;

// Error types
pub use error::{NetworkError, NetworkResult};

// Configuration
pub use config::{BackendKind, NetworkConfig};
pub use store::{ConfigStore, FileConfigStore, MemoryConfigStore};

// Driver contract
pub use driver::{Driver, LinkReporter, SocketId};
pub use registry::{BackendRegistry, DriverFactory};
pub use state::{ConnectivityState, FaultScope, LinkEvent};

// Binding and sockets
pub use handle::{HandleId, NetworkHandle};
pub use socket::{Socket, SocketInfo, SocketRole, SocketState};
pub use subsystem::NetworkSubsystem;

// Events
pub use events::{CallbackHandler, EventHandler, NetworkEvent};

// Host OS backend
#[cfg(feature = "host-socket")]
pub use host_socket::{HostSocketDriver, HostSocketParams};

// Mock driver for testing
pub use mock::{MockDriver, MockRecv, MockSend};
