//! Transport trait for PJLink communication.
//!
//! The [`Transport`] trait abstracts over the TCP link to a projector or
//! display. The protocol engine in `pjlink-client` operates on a
//! `Transport` rather than directly on a socket, enabling both real
//! device control and deterministic unit testing with `MockTransport`
//! from the `pjlink-test-harness` crate.
//!
//! PJLink is strictly line-oriented: every request and response ends in
//! a carriage return (0x0D), so the read side of the contract is a
//! CR-framed [`read_line`](Transport::read_line) rather than a raw
//! buffer fill.

use async_trait::async_trait;

use crate::error::Result;

/// Connection state reported by a transport.
///
/// `Unknown` covers the window before the first open attempt, when the
/// caller cannot tell whether a previous session is still usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No usable connection.
    Disconnected,
    /// An open socket is available.
    Connected,
    /// The state has not been determined yet.
    Unknown,
}

/// Asynchronous byte-level transport to a PJLink device.
///
/// Implementations handle socket lifecycle and CR framing. Protocol
/// concerns (command structure, authentication digests) belong to the
/// engine that consumes this trait.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the connection to the device.
    ///
    /// Opening an already-open transport is a no-op.
    async fn open(&mut self) -> Result<()>;

    /// Close the connection.
    ///
    /// After `close()`, subsequent `write()` and `read_line()` calls
    /// return [`Error::NotConnected`](crate::error::Error::NotConnected)
    /// until the transport is reopened.
    async fn close(&mut self) -> Result<()>;

    /// Write raw bytes to the device.
    ///
    /// Writing an empty slice is a no-op on the wire; the PJLink engine
    /// uses it to pull a queued response without issuing a command.
    async fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read one response frame, up to and including the 0x0D terminator.
    ///
    /// Returns the raw frame bytes. An empty vector indicates the peer
    /// produced an empty frame (some devices greet with nothing).
    async fn read_line(&mut self) -> Result<Vec<u8>>;

    /// Report the current connection state.
    fn state(&self) -> LinkState;
}
