use std::io;
use thiserror::Error;

/// Failure talking to a device.
///
/// Only [`DeviceError::Timeout`] is considered transient; the transition logic
/// retries liveness probes on it and nothing else.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("timed out: {0}")]
    Timeout(String),

    #[error("{0}")]
    Transport(String),

    #[error("protocol mismatch: {0}")]
    ProtocolMismatch(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl DeviceError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DeviceError::Timeout(_))
    }
}

impl From<io::Error> for DeviceError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                DeviceError::Timeout(err.to_string())
            }
            _ => DeviceError::Transport(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for DeviceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DeviceError::Timeout(err.to_string())
        } else if err.is_decode() {
            DeviceError::ProtocolMismatch(err.to_string())
        } else {
            DeviceError::Transport(err.to_string())
        }
    }
}
