//! TCP transport for PJLink communication.
//!
//! This module provides [`TcpTransport`], which implements the
//! [`Transport`] trait over the PJLink TCP service (default port 4352).
//!
//! The transport frames reads on the protocol's 0x0D terminator: bytes
//! are accumulated in an internal buffer and handed out one response
//! line at a time, so a single socket read that happens to carry more
//! than one queued reply never loses data.
//!
//! # Example
//!
//! ```no_run
//! use pjlink_transport::TcpTransport;
//! use pjlink_core::transport::Transport;
//!
//! # async fn example() -> pjlink_core::Result<()> {
//! let mut transport = TcpTransport::new("192.168.1.50:4352");
//! transport.open().await?;
//!
//! transport.write(b"%1POWR ?\r").await?;
//! let line = transport.read_line().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use bytes::BytesMut;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use pjlink_core::error::{Error, Result};
use pjlink_core::transport::{LinkState, Transport};

/// Response frame terminator: every PJLink line ends in CR.
const TERMINATOR: u8 = 0x0D;

/// Default connection timeout (5 seconds).
///
/// Generous enough for LAN-attached projectors, short enough that a
/// monitoring cycle against an unreachable device fails promptly.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default read timeout (10 seconds).
///
/// PJLink devices answer well within this; a longer silence means the
/// session is gone and surfaces as a transport error.
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// TCP transport for PJLink devices.
///
/// The connection is opened lazily via [`open`](Transport::open), so a
/// client can be constructed before the device is reachable and the
/// session re-established after a pause.
#[derive(Debug)]
pub struct TcpTransport {
    /// The `host:port` address string.
    addr: String,
    /// The underlying TCP stream, `None` while disconnected.
    stream: Option<TcpStream>,
    /// Unconsumed bytes read past the last frame terminator.
    read_buf: BytesMut,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl TcpTransport {
    /// Create a transport for the given `host:port` address.
    ///
    /// No connection is made until [`open`](Transport::open) is called.
    pub fn new(addr: impl Into<String>) -> Self {
        TcpTransport {
            addr: addr.into(),
            stream: None,
            read_buf: BytesMut::with_capacity(256),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Override the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Override the per-read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Get the address string this transport connects to.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Pop one complete frame (terminator included) from the buffer.
    fn take_frame(&mut self) -> Option<Vec<u8>> {
        let pos = self.read_buf.iter().position(|&b| b == TERMINATOR)?;
        Some(self.read_buf.split_to(pos + 1).to_vec())
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn open(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        tracing::debug!(addr = %self.addr, "connecting to PJLink device");
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| {
                tracing::error!(addr = %self.addr, "TCP connection timed out");
                Error::Transport(format!("connect timed out: {}", self.addr))
            })?
            .map_err(|e| {
                tracing::error!(addr = %self.addr, error = %e, "TCP connection failed");
                map_connect_error(e, &self.addr)
            })?;

        // Disable Nagle's algorithm; PJLink exchanges are small and
        // latency-sensitive.
        if let Err(e) = stream.set_nodelay(true) {
            tracing::warn!(addr = %self.addr, error = %e, "failed to set TCP_NODELAY (continuing anyway)");
        }

        tracing::info!(addr = %self.addr, "TCP connection established");
        self.read_buf.clear();
        self.stream = Some(stream);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            tracing::debug!(addr = %self.addr, "closing TCP connection");
            if let Err(e) = stream.shutdown().await {
                tracing::warn!(addr = %self.addr, error = %e, "failed to shutdown TCP stream (continuing anyway)");
            }
        }
        self.read_buf.clear();
        Ok(())
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        if data.is_empty() {
            return Ok(());
        }

        tracing::trace!(addr = %self.addr, bytes = data.len(), data = ?data, "sending");
        stream.write_all(data).await.map_err(map_io_error)?;
        stream.flush().await.map_err(map_io_error)?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<Vec<u8>> {
        loop {
            if let Some(frame) = self.take_frame() {
                tracing::trace!(addr = %self.addr, data = ?frame, "received line");
                return Ok(frame);
            }

            let read_timeout = self.read_timeout;
            let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
            let mut buf = [0u8; 256];
            let n = tokio::time::timeout(read_timeout, stream.read(&mut buf))
                .await
                .map_err(|_| {
                    tracing::trace!("timeout waiting for response line");
                    Error::Transport("read timed out".to_string())
                })?
                .map_err(map_io_error)?;

            if n == 0 {
                // 0 bytes on TCP means the peer closed the connection.
                tracing::warn!(addr = %self.addr, "peer closed connection");
                self.stream = None;
                return Err(Error::ConnectionLost);
            }
            self.read_buf.extend_from_slice(&buf[..n]);
        }
    }

    fn state(&self) -> LinkState {
        if self.stream.is_some() {
            LinkState::Connected
        } else {
            LinkState::Disconnected
        }
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        if self.stream.is_some() {
            tracing::debug!(addr = %self.addr, "TcpTransport dropped, closing connection");
        }
    }
}

/// Map a connection-time I/O error to the appropriate [`Error`] variant.
fn map_connect_error(e: std::io::Error, addr: &str) -> Error {
    match e.kind() {
        std::io::ErrorKind::ConnectionRefused => {
            Error::Transport(format!("connection refused: {addr}"))
        }
        _ => Error::Io(e),
    }
}

/// Map a data-path I/O error to the appropriate [`Error`] variant.
fn map_io_error(e: std::io::Error) -> Error {
    match e.kind() {
        std::io::ErrorKind::ConnectionReset
        | std::io::ErrorKind::BrokenPipe
        | std::io::ErrorKind::NotConnected
        | std::io::ErrorKind::ConnectionAborted => Error::ConnectionLost,
        _ => Error::Io(e),
    }
}
