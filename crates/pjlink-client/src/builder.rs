//! PjLinkBuilder -- fluent builder for constructing [`PjLinkClient`]
//! instances.
//!
//! Separates configuration from construction so that callers can set up
//! credentials, cooldowns, and refresh periods before the first device
//! contact. The connection itself is established lazily on the first
//! poll or control.
//!
//! # Example
//!
//! ```no_run
//! use pjlink_client::builder::PjLinkBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> pjlink_core::Result<()> {
//! let client = PjLinkBuilder::new("192.168.1.50")
//!     .password("JBMIAProjectorLink")
//!     .commands_cooldown(Duration::from_millis(250))
//!     .build();
//!
//! let snapshot = client.poll().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use pjlink_core::metadata::{MetadataProvider, StaticMetadata};
use pjlink_core::transport::Transport;
use pjlink_transport::TcpTransport;

use crate::client::{ClientConfig, PjLinkClient};

/// Standard PJLink TCP port.
pub const DEFAULT_PORT: u16 = 4352;

/// Lower bound for the inter-command cooldown; smaller configured
/// values are clamped up to this.
const MIN_COMMANDS_COOLDOWN: Duration = Duration::from_millis(200);

/// Default idle period before the supervisor refreshes the session.
const DEFAULT_KEEP_ALIVE: Duration = Duration::from_millis(25_000);

/// Default input catalog refresh period.
const DEFAULT_INPUT_REFRESH: Duration = Duration::from_secs(30 * 60);

/// Fluent builder for [`PjLinkClient`].
pub struct PjLinkBuilder {
    host: String,
    port: u16,
    password: Option<String>,
    commands_cooldown: Duration,
    connection_keep_alive: Duration,
    input_refresh: Duration,
    metadata: Option<Arc<dyn MetadataProvider>>,
}

impl PjLinkBuilder {
    /// Create a builder for the device at `host` on the default PJLink
    /// port.
    pub fn new(host: &str) -> Self {
        PjLinkBuilder {
            host: host.to_string(),
            port: DEFAULT_PORT,
            password: None,
            commands_cooldown: MIN_COMMANDS_COOLDOWN,
            connection_keep_alive: DEFAULT_KEEP_ALIVE,
            input_refresh: DEFAULT_INPUT_REFRESH,
            metadata: None,
        }
    }

    /// Override the TCP port (default 4352).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the PJLink password used when the device requests
    /// authentication.
    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    /// Set the minimum gap between commands (default 200 ms).
    ///
    /// Values below 200 ms are clamped up; PJLink devices commonly
    /// misbehave when commands arrive faster than that.
    pub fn commands_cooldown(mut self, cooldown: Duration) -> Self {
        self.commands_cooldown = cooldown.max(MIN_COMMANDS_COOLDOWN);
        self
    }

    /// Set the idle period after which the keep-alive supervisor
    /// refreshes the TCP session (default 25 s). Must stay below the
    /// device's own idle timeout. A zero duration disables the
    /// supervisor entirely.
    pub fn connection_keep_alive(mut self, period: Duration) -> Self {
        self.connection_keep_alive = period;
        self
    }

    /// Set the input catalog refresh period (default 30 minutes).
    pub fn input_refresh_interval(mut self, period: Duration) -> Self {
        self.input_refresh = period;
        self
    }

    /// Supply the adapter metadata provider (defaults to
    /// [`StaticMetadata`]).
    pub fn metadata(mut self, provider: Arc<dyn MetadataProvider>) -> Self {
        self.metadata = Some(provider);
        self
    }

    /// Build the client with a [`TcpTransport`] to `host:port`.
    ///
    /// Must be called within a Tokio runtime when the keep-alive
    /// supervisor is enabled.
    pub fn build(self) -> PjLinkClient {
        let addr = format!("{}:{}", self.host, self.port);
        let transport = Box::new(TcpTransport::new(addr));
        self.build_with_transport(transport)
    }

    /// Build the client over a caller-supplied transport (used with the
    /// mock transport in tests).
    pub fn build_with_transport(self, transport: Box<dyn Transport>) -> PjLinkClient {
        let config = ClientConfig {
            password: self.password,
            commands_cooldown: self.commands_cooldown.max(MIN_COMMANDS_COOLDOWN),
            keep_alive: self.connection_keep_alive,
            input_refresh: self.input_refresh,
        };
        let metadata = self
            .metadata
            .unwrap_or_else(|| Arc::new(StaticMetadata::default()));
        PjLinkClient::new(transport, config, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_below_floor_is_clamped() {
        let builder = PjLinkBuilder::new("localhost").commands_cooldown(Duration::from_millis(50));
        assert_eq!(builder.commands_cooldown, Duration::from_millis(200));
    }

    #[test]
    fn cooldown_above_floor_is_kept() {
        let builder = PjLinkBuilder::new("localhost").commands_cooldown(Duration::from_millis(500));
        assert_eq!(builder.commands_cooldown, Duration::from_millis(500));
    }

    #[test]
    fn defaults() {
        let builder = PjLinkBuilder::new("projector.local");
        assert_eq!(builder.port, 4352);
        assert_eq!(builder.commands_cooldown, Duration::from_millis(200));
        assert_eq!(builder.connection_keep_alive, Duration::from_millis(25_000));
        assert_eq!(builder.input_refresh, Duration::from_secs(1800));
        assert!(builder.password.is_none());
    }
}
