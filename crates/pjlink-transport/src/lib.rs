//! pjlink-transport: Transport implementations for pjlink.
//!
//! Currently provides [`TcpTransport`], the standard PJLink transport
//! (TCP, default port 4352, CR-framed responses). The protocol engine in
//! `pjlink-client` consumes any [`pjlink_core::Transport`], so tests use
//! the mock from `pjlink-test-harness` instead.

pub mod tcp;

pub use tcp::TcpTransport;
