//! # pjlink -- Async PJLink Control for Projectors and Displays
//!
//! `pjlink` is an asynchronous Rust client for the PJLink protocol
//! (Class 1 and Class 2): power, input switching, audio/video mute,
//! freeze, volume stepping, error status, lamp and filter monitoring,
//! with the session, authentication, and keep-alive handling a real
//! device deployment needs.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! pjlink = "0.1"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! Poll a projector and switch it on:
//!
//! ```no_run
//! use pjlink::{property, PjLinkBuilder};
//!
//! #[tokio::main]
//! async fn main() -> pjlink::Result<()> {
//!     let client = PjLinkBuilder::new("192.168.1.50")
//!         .password("JBMIAProjectorLink")
//!         .build();
//!
//!     let snapshot = client.poll().await?;
//!     println!("class:  {:?}", snapshot.get(property::PJLINK_CLASS));
//!     println!("power:  {:?}", snapshot.get(property::POWER));
//!
//!     client.control(property::POWER, "1").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized as a workspace of focused crates:
//!
//! | Crate                 | Purpose                                     |
//! |-----------------------|---------------------------------------------|
//! | `pjlink-core`         | Traits, snapshot/control types, errors      |
//! | `pjlink-transport`    | TCP transport (CR-framed line reads)        |
//! | `pjlink-client`       | Protocol engine: polling, control, session  |
//! | `pjlink-test-harness` | Scripted mock transport for tests           |
//! | **`pjlink`**          | This facade crate -- re-exports everything  |
//!
//! ## Behavior notes
//!
//! - One client instance controls one device; every byte exchange is
//!   serialized, with a configurable inter-command cooldown (200 ms
//!   floor).
//! - Authentication (`PJLINK 1 <nonce>` banners) happens at most once
//!   per session, transparently.
//! - Commands the device rejects with ERR1 are remembered and skipped
//!   on later polls.
//! - A background supervisor keeps the TCP session warm while the host
//!   polls, and releases it when polling stops.

pub use pjlink_client::{PjLinkBuilder, PjLinkClient, DEFAULT_PORT};
pub use pjlink_core::types::{property, status};
pub use pjlink_core::{
    Control, ControlKind, DeviceClass, Error, LinkState, MetadataProvider, Result, Snapshot,
    StaticMetadata, Transport,
};
pub use pjlink_transport::TcpTransport;
