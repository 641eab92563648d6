//! pjlink-core: Core traits, types, and error definitions for pjlink.
//!
//! This crate defines the protocol-agnostic abstractions shared by the
//! pjlink workspace. Hosts embedding the client depend on these types
//! without pulling in the protocol engine or a concrete transport.
//!
//! # Key types
//!
//! - [`Transport`] -- CR-framed byte-level channel to the device
//! - [`Snapshot`] -- one poll's property map and control list
//! - [`MetadataProvider`] -- source of the adapter metadata entries
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod metadata;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use pjlink_core::*`.
pub use error::{Error, Result};
pub use metadata::{MetadataProvider, StaticMetadata};
pub use transport::{LinkState, Transport};
pub use types::{normalize_uptime, Control, ControlKind, DeviceClass, Snapshot};
