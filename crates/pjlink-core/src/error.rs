//! Error types for the pjlink workspace.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport-level failures and the
//! device-reported PJLink error classes (ERR1..ERR4, ERRA) are all
//! captured here.

/// The error type for all pjlink operations.
///
/// Variants cover the failure modes seen when talking to a PJLink
/// projector or display: socket-level faults, the four numbered device
/// error replies, and the authentication rejection.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The device rejected the authentication digest (`PJLINK ERRA`).
    #[error("authentication failed")]
    AuthFailed,

    /// The device answered ERR1 -- the command is not defined on this
    /// device. The engine records the command and skips it thereafter.
    #[error("unsupported command: {0}")]
    Unsupported(String),

    /// The device answered ERR2 -- a parameter was out of range.
    #[error("out of parameter: {0}")]
    BadParameter(String),

    /// The device answered ERR3 -- the command cannot be performed in the
    /// device's current state (e.g. input switch while in standby).
    #[error("device busy: {0}")]
    DeviceBusy(String),

    /// The device answered ERR4 -- projector or display failure.
    #[error("device failure: {0}")]
    DeviceFailure(String),

    /// A transport-level error (connect, read, write) after any retries
    /// have been exhausted.
    #[error("transport error: {0}")]
    Transport(String),

    /// No connection to the device has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the device was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` for socket-level failures that the transport gate
    /// may retry with the same bytes.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::ConnectionLost | Error::Io(_)
        )
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
