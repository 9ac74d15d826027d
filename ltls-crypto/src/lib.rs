//! # ltls Cryptographic Provider Interface
//!
//! This crate defines the cryptographic abstraction layer used by the ltls
//! TLS 1.0-1.2 client. The protocol engine never touches a concrete
//! algorithm implementation; it asks a [`CryptoProvider`] for trait objects.
//!
//! ## Architecture
//!
//! ```text
//! CryptoProvider (main trait)
//! ├── Hash        (MD5, SHA-1, SHA-256)
//! ├── Hmac        (HMAC over the same hashes)
//! ├── BulkCipher  (RC4-128, AES-128-CBC, AES-256-CBC)
//! ├── Random      (CSPRNG)
//! └── KeyExchange (RSA PKCS#1 v1.5 encryption, finite-field DH)
//! ```
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use ltls_crypto::{CryptoProvider, HashAlgorithm};
//!
//! fn digest(provider: &dyn CryptoProvider) -> ltls_crypto::Result<Vec<u8>> {
//!     let mut hash = provider.hash(HashAlgorithm::Sha256)?;
//!     hash.update(b"abc");
//!     Ok(hash.finalize())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unused_qualifications,
    missing_debug_implementations
)]

pub mod cipher;
pub mod error;
pub mod hash;
pub mod hmac;
pub mod key_exchange;
pub mod random;

pub use cipher::{BulkCipher, BulkCipherAlgorithm, CipherType};
pub use error::{Error, Result};
pub use hash::{Hash, HashAlgorithm};
pub use hmac::Hmac;
pub use key_exchange::{DhKeyPair, DhParameters, KeyExchange, RsaPublicKey};
pub use random::Random;

/// The main cryptographic provider trait.
///
/// Implementations hand out fresh algorithm instances on demand. The TLS
/// engine holds the provider behind `Arc<dyn CryptoProvider>` so the trait
/// stays object-safe apart from the constructor.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` so one provider can be shared
/// by many connections.
pub trait CryptoProvider: Send + Sync + 'static {
    /// Create a new instance of the crypto provider.
    fn new() -> Self
    where
        Self: Sized;

    /// Get a hash function instance.
    ///
    /// # Arguments
    ///
    /// * `algorithm` - The hash algorithm to use
    fn hash(&self, algorithm: HashAlgorithm) -> Result<Box<dyn Hash>>;

    /// Get an HMAC instance keyed with `key`.
    ///
    /// # Arguments
    ///
    /// * `algorithm` - The hash algorithm to use for HMAC
    /// * `key` - The HMAC key (any length)
    fn hmac(&self, algorithm: HashAlgorithm, key: &[u8]) -> Result<Box<dyn Hmac>>;

    /// Get a keyed bulk cipher instance for one direction of a connection.
    ///
    /// # Arguments
    ///
    /// * `algorithm` - The bulk cipher algorithm
    /// * `key` - Cipher key, must match [`BulkCipherAlgorithm::key_size`]
    /// * `iv` - Initial chaining value for block ciphers (empty for streams)
    fn cipher(
        &self,
        algorithm: BulkCipherAlgorithm,
        key: &[u8],
        iv: &[u8],
    ) -> Result<Box<dyn BulkCipher>>;

    /// Get the random number generator.
    fn random(&self) -> &dyn Random;

    /// Get the key exchange primitives (RSA encryption, DH).
    fn key_exchange(&self) -> &dyn KeyExchange;

    /// Check whether a bulk cipher is supported by this provider.
    fn supports_cipher(&self, algorithm: BulkCipherAlgorithm) -> bool {
        let key = vec![0u8; algorithm.key_size()];
        let iv = vec![0u8; algorithm.iv_size()];
        self.cipher(algorithm, &key, &iv).is_ok()
    }
}
