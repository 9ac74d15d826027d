//! # LTLS Core
//!
//! Sans-IO TLS 1.0, 1.1 and 1.2 client engine.
//!
//! This crate provides the protocol machinery behind the `ltls` API:
//! - Handshake state machine (RSA and DHE key exchange)
//! - Message codec for records, handshake messages and alerts
//! - Record layer protection (RC4 and AES-CBC with HMAC)
//! - PRF key schedule
//! - Minimal DER decoder for the server's RSA key
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │      Public API (ltls: Session)         │
//! └─────────────────┬───────────────────────┘
//!                   │ bytes in / bytes out
//! ┌─────────────────▼───────────────────────┐
//! │       ltls-core (this crate)            │
//! │  ┌──────────────────────────────────┐   │
//! │  │   ClientConnection + State       │   │
//! │  ├──────────────────────────────────┤   │
//! │  │   Messages / Codec / Alerts      │   │
//! │  ├──────────────────────────────────┤   │
//! │  │   Record Protection              │   │
//! │  ├──────────────────────────────────┤   │
//! │  │   PRF / Key Block / ASN.1        │   │
//! │  └──────────────────────────────────┘   │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │      ltls-crypto (trait interface)      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! The engine never performs I/O. Certificates are parsed only far enough
//! to extract the RSA key; the chain is not validated.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    unused_qualifications
)]
#![forbid(unsafe_code)]

// Re-export crypto interface
pub use ltls_crypto;

pub mod alert;
pub mod asn1;
pub mod certificate;
pub mod cipher_suites;
pub mod client;
pub mod codec;
pub mod context;
pub mod error;
pub mod extensions;
pub mod key_block;
pub mod messages;
pub mod prf;
pub mod protocol;
pub mod record;
pub mod record_protection;
pub mod state;
pub mod transcript;

// Re-exports
pub use alert::{Alert, AlertLevel};
pub use cipher_suites::CipherSuite;
pub use client::ClientConnection;
pub use error::{AlertDescription, Error, ErrorCategory, Result};
pub use protocol::{ContentType, ProtocolVersion};
pub use state::HandshakeMode;

use record::MAX_FRAGMENT_SIZE;

/// Connection parameters.
///
/// # Example
///
/// ```rust
/// use ltls_core::{Config, ProtocolVersion};
///
/// let config = Config::builder()
///     .with_protocol_versions(ProtocolVersion::Tls11, ProtocolVersion::Tls12)
///     .with_server_name("example.com")
///     .build()
///     .unwrap();
/// assert_eq!(config.max_version, ProtocolVersion::Tls12);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Lowest acceptable version
    pub min_version: ProtocolVersion,

    /// Highest version, offered in ClientHello
    pub max_version: ProtocolVersion,

    /// Offered cipher suite ids, in preference order
    pub cipher_suites: Vec<u16>,

    /// Host name sent in the server_name extension
    pub server_name: Option<String>,

    /// Largest application data fragment per record (default: 16384)
    pub max_fragment_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_version: ProtocolVersion::Tls10,
            max_version: ProtocolVersion::Tls12,
            cipher_suites: cipher_suites::default_cipher_suites(),
            server_name: None,
            max_fragment_length: MAX_FRAGMENT_SIZE,
        }
    }
}

impl Config {
    /// Create a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the invariants [`ConfigBuilder::build`] enforces.
    ///
    /// Suites that need a version above `max_version` are allowed as long
    /// as at least one offered suite is usable; the connection drops the
    /// others from its ClientHello.
    pub fn validate(&self) -> Result<()> {
        if self.min_version > self.max_version {
            return Err(Error::InvalidConfig(format!(
                "min version {} above max version {}",
                self.min_version, self.max_version
            )));
        }

        if self.cipher_suites.is_empty() {
            return Err(Error::InvalidConfig("No cipher suites specified".into()));
        }
        let mut usable = false;
        for &id in &self.cipher_suites {
            let suite = cipher_suites::lookup(id)
                .map_err(|_| Error::InvalidConfig(format!("Unknown cipher suite 0x{:04X}", id)))?;
            usable |= suite.supports_version(self.max_version);
        }
        if !usable {
            return Err(Error::InvalidConfig(format!(
                "No cipher suite usable with {}",
                self.max_version
            )));
        }

        if self.max_fragment_length == 0 || self.max_fragment_length > MAX_FRAGMENT_SIZE {
            return Err(Error::InvalidConfig(format!(
                "Max fragment length must be 1..={}",
                MAX_FRAGMENT_SIZE
            )));
        }

        if let Some(host) = &self.server_name {
            if host.is_empty() || !host.is_ascii() {
                return Err(Error::InvalidConfig(format!("Invalid server name {:?}", host)));
            }
        }

        Ok(())
    }
}

/// Configuration builder.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the accepted version range.
    pub fn with_protocol_versions(mut self, min: ProtocolVersion, max: ProtocolVersion) -> Self {
        self.config.min_version = min;
        self.config.max_version = max;
        self
    }

    /// Set offered cipher suites, in preference order.
    pub fn with_cipher_suites(mut self, suites: &[u16]) -> Self {
        self.config.cipher_suites = suites.to_vec();
        self
    }

    /// Send the server_name extension for `host`.
    pub fn with_server_name(mut self, host: impl Into<String>) -> Self {
        self.config.server_name = Some(host.into());
        self
    }

    /// Set maximum application data fragment length.
    pub fn with_max_fragment_length(mut self, length: usize) -> Self {
        self.config.max_fragment_length = length;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
