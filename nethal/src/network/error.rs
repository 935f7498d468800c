// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network Error Types

use thiserror::Error;

use super::config::BackendKind;
use super::state::ConnectivityState;

/// Result type for network operations.
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Errors raised by the network subsystem and by backend drivers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// No backend has been configured in the config store.
    #[error("No network backend configured")]
    ConfigurationMissing,

    /// The configured backend is not compiled into this build.
    #[error("Unsupported network backend: {0}")]
    UnsupportedBackend(BackendKind),

    /// The persisted configuration could not be decoded.
    #[error("Invalid network configuration: {0}")]
    InvalidConfiguration(String),

    /// A socket operation was attempted with no handle bound.
    #[error("Network not configured")]
    NotConfigured,

    /// An operation needing a routable address was attempted early.
    #[error("Not online (state: {0})")]
    NotOnline(ConnectivityState),

    /// The descriptor belongs to a torn-down or demoted binding.
    #[error("Socket invalidated")]
    SocketInvalidated,

    /// The descriptor was already closed.
    #[error("Socket closed")]
    SocketClosed,

    /// The operation does not apply to this socket.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Hostname resolution failed.
    #[error("Resolution failed: {0}")]
    ResolutionFailed(String),

    /// Backend I/O failure. The socket must be closed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The peer closed the connection.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Reading or writing the config store failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl NetworkError {
    /// Returns true for rejections issued before any hardware was touched.
    ///
    /// These are safe to retry on a later tick.
    pub fn is_policy_rejection(&self) -> bool {
        matches!(self, NetworkError::NotConfigured | NetworkError::NotOnline(_))
    }

    /// Returns true if the socket involved can no longer be used.
    pub fn requires_close(&self) -> bool {
        matches!(
            self,
            NetworkError::Transport(_)
                | NetworkError::ConnectionClosed
                | NetworkError::SocketInvalidated
        )
    }
}

impl From<std::io::Error> for NetworkError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof => NetworkError::ConnectionClosed,
            _ => NetworkError::Transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(err: serde_json::Error) -> Self {
        NetworkError::InvalidConfiguration(err.to_string())
    }
}
