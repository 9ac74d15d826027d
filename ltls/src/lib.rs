//! # LTLS - Legacy TLS Client
//!
//! A TLS 1.0, 1.1 and 1.2 client for talking to servers that predate
//! TLS 1.3:
//! - RSA and finite-field DHE key exchange
//! - RC4-128 and AES-CBC bulk ciphers with MD5, SHA-1 or SHA-256 MACs
//! - Server Name Indication
//! - Blocking sessions over any `Read + Write` transport
//! - Tokio streams behind the `async` feature
//!
//! The server certificate chain is **not** validated. Anyone able to
//! intercept the connection can impersonate the server unless the
//! application checks [`Session::peer_certificates`] itself.
//!
//! ## Quick Start
//!
//! ### Blocking Client Example
//!
//! ```rust,no_run
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use ltls::{ClientConfig, Session};
//!
//! let config = ClientConfig::builder().build()?;
//! let mut session = Session::connect("example.com", 443, &config)?;
//!
//! session.write(b"GET / HTTP/1.0\r\nHost: example.com\r\n\r\n")?;
//! let mut buf = [0u8; 4096];
//! let n = session.read(&mut buf)?;
//! println!("{}", String::from_utf8_lossy(&buf[..n]));
//! session.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Async Client Example
//!
//! ```rust,no_run
//! # #[cfg(feature = "async")]
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use ltls::{ClientConfig, TlsStream};
//! use tokio::net::TcpStream;
//!
//! let config = ClientConfig::builder().build()?;
//! let tcp_stream = TcpStream::connect("example.com:443").await?;
//! let mut tls_stream = TlsStream::connect(&config, "example.com", tcp_stream).await?;
//! tls_stream.write_all(b"GET / HTTP/1.0\r\n\r\n").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `async`: Enable async I/O with Tokio

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    unused_qualifications
)]
#![forbid(unsafe_code)]

pub use ltls_core::{
    AlertDescription, CipherSuite, Config, Error, ErrorCategory, ProtocolVersion, Result,
};

pub mod client;
pub mod session;

#[cfg(feature = "async")]
pub mod stream;

pub use client::{ClientConfig, ClientConfigBuilder};
pub use session::Session;

#[cfg(feature = "async")]
pub use stream::TlsStream;
