//! TLS client configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ltls_core::{Config, ProtocolVersion, Result};
use ltls_crypto::CryptoProvider;
use ltls_crypto_rustcrypto::RustCryptoProvider;

/// Client configuration for TLS sessions.
#[derive(Clone)]
pub struct ClientConfig {
    /// Engine configuration (versions, suites, SNI, fragment size)
    pub config: Config,

    /// Crypto backend shared by every session built from this config
    pub provider: Arc<dyn CryptoProvider>,

    /// Read/write timeout applied to sockets opened by [`Session::connect`]
    ///
    /// [`Session::connect`]: crate::Session::connect
    pub io_timeout: Option<Duration>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("config", &self.config)
            .field("io_timeout", &self.io_timeout)
            .finish_non_exhaustive()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            config: Config::default(),
            provider: Arc::new(RustCryptoProvider::default()),
            io_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Copy of this configuration sending `host` as SNI, unless a server
    /// name is already set or `host` is an IP literal.
    pub(crate) fn for_host(&self, host: &str) -> Self {
        let mut config = self.clone();
        if config.config.server_name.is_none() && host.parse::<std::net::IpAddr>().is_err() {
            config.config.server_name = Some(host.to_string());
        }
        config
    }
}

/// Builder for client configuration.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the accepted version range.
    pub fn with_protocol_versions(mut self, min: ProtocolVersion, max: ProtocolVersion) -> Self {
        self.config.config.min_version = min;
        self.config.config.max_version = max;
        self
    }

    /// Set offered cipher suites, in preference order.
    pub fn with_cipher_suites(mut self, suites: &[u16]) -> Self {
        self.config.config.cipher_suites = suites.to_vec();
        self
    }

    /// Send the server_name extension for `host`.
    pub fn with_server_name(mut self, host: impl Into<String>) -> Self {
        self.config.config.server_name = Some(host.into());
        self
    }

    /// Set maximum application data fragment length.
    pub fn with_max_fragment_length(mut self, length: usize) -> Self {
        self.config.config.max_fragment_length = length;
        self
    }

    /// Use a different crypto backend.
    pub fn with_provider(mut self, provider: Arc<dyn CryptoProvider>) -> Self {
        self.config.provider = provider;
        self
    }

    /// Set the socket timeout used by [`Session::connect`](crate::Session::connect).
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.config.io_timeout = Some(timeout);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<ClientConfig> {
        self.config.config.validate()?;
        Ok(self.config)
    }
}
