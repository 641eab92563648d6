//! Mock transport for deterministic testing of the protocol engine.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/response pairs. Every PJLink exchange is one write followed
//! by one framed read, so each expectation scripts exactly one
//! exchange; a blank exchange (the engine pulling a queued reply or the
//! connection banner) is scripted with an empty request.
//!
//! The handle is cheaply cloneable: tests keep one clone for
//! assertions after moving the other into the client.
//!
//! # Example
//!
//! ```
//! use pjlink_test_harness::MockTransport;
//!
//! let mock = MockTransport::new();
//! // Greeting: blank exchange pulls the no-auth banner.
//! mock.expect(b"", b"PJLINK 0\r");
//! // Then the class query.
//! mock.expect(b"%1CLSS ?\r", b"%1CLSS=2\r");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use pjlink_core::error::{Error, Result};
use pjlink_core::transport::{LinkState, Transport};

/// A pre-loaded request/response pair for one exchange.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes the engine is expected to write (empty for a
    /// blank exchange).
    request: Vec<u8>,
    /// The response frame to hand back on the following read.
    response: Vec<u8>,
}

#[derive(Debug, Default)]
struct MockInner {
    expectations: VecDeque<Expectation>,
    pending_response: Option<Vec<u8>>,
    connected: bool,
    sent_log: Vec<Vec<u8>>,
    fail_writes: u32,
}

/// A scripted [`Transport`] for testing without hardware.
///
/// Expectations are consumed in order. `write()` matches the sent bytes
/// against the next expectation and stages its response for the
/// following `read_line()`. A mismatch or an exhausted script surfaces
/// as a transport error, failing the test through the engine's normal
/// error path.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockInner>>,
}

impl MockTransport {
    /// Create a mock transport in the disconnected state; the engine's
    /// handshake opens it.
    pub fn new() -> Self {
        MockTransport::default()
    }

    /// Add an expected request/response pair for one exchange.
    pub fn expect(&self, request: &[u8], response: &[u8]) {
        self.inner
            .lock()
            .unwrap()
            .expectations
            .push_back(Expectation {
                request: request.to_vec(),
                response: response.to_vec(),
            });
    }

    /// Make the next `n` writes fail with a transport error without
    /// consuming an expectation, for exercising the retry path.
    pub fn fail_next_writes(&self, n: u32) {
        self.inner.lock().unwrap().fail_writes = n;
    }

    /// All byte sequences written through this transport, in order.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        self.inner.lock().unwrap().sent_log.clone()
    }

    /// The number of expectations not yet consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.inner.lock().unwrap().expectations.len()
    }

    /// Whether the engine currently holds the connection open.
    pub fn is_connected(&self) -> bool {
        self.inner.lock().unwrap().connected
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&mut self) -> Result<()> {
        self.inner.lock().unwrap().connected = true;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.connected = false;
        inner.pending_response = None;
        Ok(())
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.connected {
            return Err(Error::NotConnected);
        }
        if inner.fail_writes > 0 {
            inner.fail_writes -= 1;
            return Err(Error::Transport("injected write failure".into()));
        }

        inner.sent_log.push(data.to_vec());
        match inner.expectations.pop_front() {
            Some(expectation) => {
                if data != expectation.request.as_slice() {
                    return Err(Error::Transport(format!(
                        "unexpected request: expected {:?}, got {:?}",
                        String::from_utf8_lossy(&expectation.request),
                        String::from_utf8_lossy(data)
                    )));
                }
                inner.pending_response = Some(expectation.response);
                Ok(())
            }
            None => Err(Error::Transport(format!(
                "no more expectations, got {:?}",
                String::from_utf8_lossy(data)
            ))),
        }
    }

    async fn read_line(&mut self) -> Result<Vec<u8>> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.connected {
            return Err(Error::NotConnected);
        }
        inner
            .pending_response
            .take()
            .ok_or_else(|| Error::Transport("no scripted response available".into()))
    }

    fn state(&self) -> LinkState {
        if self.inner.lock().unwrap().connected {
            LinkState::Connected
        } else {
            LinkState::Disconnected
        }
    }
}
