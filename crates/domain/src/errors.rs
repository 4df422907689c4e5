use std::io;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DialError {
    #[error("Malformed address {address}: {reason}")]
    AddressMalformed { address: String, reason: String },

    #[error("Failed to resolve port {port}: {reason}")]
    PortResolutionFailed { port: String, reason: String },

    #[error("Failed to resolve host {host}: {reason}")]
    NameResolutionFailed { host: String, reason: String },

    #[error("No addresses found for {0}")]
    NoAddressesFound(String),

    #[error("Failed to prepare target {0}")]
    TargetPreparationFailed(String),

    #[error("Unsupported transport: {0}")]
    UnsupportedTransport(String),

    #[error("Socket creation failed: {reason}")]
    SocketCreationFailed { kind: io::ErrorKind, reason: String },

    #[error("Host refused to protect socket fd {fd}")]
    ProtectionRejected { fd: i32 },

    #[error("Connect to {target} failed: {reason}")]
    ConnectFailed {
        target: String,
        kind: io::ErrorKind,
        reason: String,
    },

    #[error("Dial to {0} timed out")]
    DialTimeout(String),

    #[error("Dial to {0} cancelled")]
    Cancelled(String),
}

impl DialError {
    pub fn socket_creation(err: &io::Error) -> Self {
        Self::SocketCreationFailed {
            kind: err.kind(),
            reason: err.to_string(),
        }
    }

    pub fn connect_failed(target: impl ToString, err: &io::Error) -> Self {
        Self::ConnectFailed {
            target: target.to_string(),
            kind: err.kind(),
            reason: err.to_string(),
        }
    }

    /// Whether a caller retry can succeed without changing its input.
    ///
    /// Resolution failures count as retryable because the preparation loop
    /// retries them; malformed input and unsupported transports never heal.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::AddressMalformed { .. }
                | Self::UnsupportedTransport(_)
                | Self::TargetPreparationFailed(_)
        )
    }
}
