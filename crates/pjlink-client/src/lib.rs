//! pjlink-client: the PJLink Class 1/2 protocol engine.
//!
//! This crate turns a [`pjlink_core::Transport`] into a monitoring and
//! control client for one PJLink projector or display:
//!
//! - [`commands`] -- the static catalog of request byte templates
//! - [`protocol`] -- response classification (values, ERR1..ERR4, banners)
//! - [`session`] -- session lifecycle and MD5 digest authentication
//! - [`client`] -- the serialized engine: polling, control dispatch,
//!   retry/scroll, capability tracking
//! - [`keepalive`] -- the background session keeper
//! - [`inputs`] -- the input name/code catalog
//! - [`builder`] -- fluent construction
//!
//! The typical entry point is [`PjLinkBuilder`]:
//!
//! ```no_run
//! use pjlink_client::PjLinkBuilder;
//! use pjlink_core::types::property;
//!
//! # async fn example() -> pjlink_core::Result<()> {
//! let client = PjLinkBuilder::new("192.168.1.50").build();
//!
//! let snapshot = client.poll().await?;
//! println!("power: {:?}", snapshot.get(property::POWER));
//!
//! client.control(property::POWER, "1").await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod client;
pub mod commands;
pub mod inputs;
mod keepalive;
pub mod protocol;
pub mod session;

pub use builder::{PjLinkBuilder, DEFAULT_PORT};
pub use client::PjLinkClient;
