//! pjlink-test-harness: deterministic test doubles for pjlink.
//!
//! Provides [`MockTransport`], a scripted [`pjlink_core::Transport`]
//! implementation that lets the protocol engine be exercised without a
//! projector on the network.

pub mod mock_transport;

pub use mock_transport::MockTransport;
