//! Error types for tinySA control.
//!
//! All fallible operations across the workspace return [`Result<T>`], which
//! uses [`Error`] as the error type. Discovery, transport, and configuration
//! failures are captured here. Malformed response lines are not errors: the
//! parsers drop them and callers see an empty or partial result instead.

/// The error type for all tinySA operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No serial endpoint matched the requested USB vendor/product pair.
    #[error("no device found with USB id {vid:04x}:{pid:04x}")]
    DeviceNotFound {
        /// USB vendor ID that was searched for.
        vid: u16,
        /// USB product ID that was searched for.
        pid: u16,
    },

    /// The device path could not be opened (absent, permission denied,
    /// or already claimed by another process).
    #[error("connection error: {0}")]
    Connection(String),

    /// A single read attempt elapsed without receiving any bytes.
    ///
    /// Raised by [`Transport::receive`](crate::Transport::receive); the line
    /// and command layers turn it into an empty result.
    #[error("timeout waiting for data")]
    Timeout,

    /// A protocol-level error (unexpected request seen by a scripted transport).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// An invalid parameter was passed to a builder or command.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The transport was used while closed.
    #[error("not connected")]
    NotConnected,

    /// The connection to the device was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
