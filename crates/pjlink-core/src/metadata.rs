//! Adapter metadata seam.
//!
//! The client publishes three `AdapterMetadata#*` entries in every
//! snapshot: version, build date, and uptime. Version and build date come
//! from a [`MetadataProvider`] supplied by the host; uptime derives from
//! the provider's start instant.

use std::time::Instant;

/// Key for the adapter version string.
pub const ADAPTER_VERSION_KEY: &str = "adapter.version";
/// Key for the adapter build date string.
pub const ADAPTER_BUILD_DATE_KEY: &str = "adapter.build.date";

/// Source of adapter metadata entries.
///
/// Hosts typically back this with a build-info file; [`StaticMetadata`]
/// covers the common case of compile-time values.
pub trait MetadataProvider: Send + Sync {
    /// Look up a metadata value by key (`adapter.version`,
    /// `adapter.build.date`).
    fn get(&self, key: &str) -> Option<String>;

    /// Monotonic instant the adapter started; uptime is measured from
    /// here.
    fn started_at(&self) -> Instant;
}

/// Metadata provider holding fixed strings captured at construction.
#[derive(Debug, Clone)]
pub struct StaticMetadata {
    version: String,
    build_date: String,
    started_at: Instant,
}

impl StaticMetadata {
    /// Create a provider with explicit version and build-date strings.
    pub fn new(version: &str, build_date: &str) -> Self {
        StaticMetadata {
            version: version.to_string(),
            build_date: build_date.to_string(),
            started_at: Instant::now(),
        }
    }
}

impl Default for StaticMetadata {
    fn default() -> Self {
        StaticMetadata::new(env!("CARGO_PKG_VERSION"), "unknown")
    }
}

impl MetadataProvider for StaticMetadata {
    fn get(&self, key: &str) -> Option<String> {
        match key {
            ADAPTER_VERSION_KEY => Some(self.version.clone()),
            ADAPTER_BUILD_DATE_KEY => Some(self.build_date.clone()),
            _ => None,
        }
    }

    fn started_at(&self) -> Instant {
        self.started_at
    }
}
