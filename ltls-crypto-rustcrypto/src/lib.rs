//! # RustCrypto-based Cryptography Provider for ltls
//!
//! This crate implements the [`ltls_crypto`] traits on top of the
//! [RustCrypto](https://github.com/RustCrypto) hash, MAC, cipher and RSA
//! crates, with `num-bigint` for the Diffie-Hellman arithmetic.
//!
//! ## Supported Algorithms
//!
//! - **Hash**: MD5, SHA-1, SHA-256
//! - **HMAC**: over the same three hashes
//! - **Bulk ciphers**: RC4-128, AES-128-CBC, AES-256-CBC
//! - **Key exchange**: RSAES-PKCS1-v1_5 encryption, finite-field DH
//! - **RNG**: operating system entropy via `rand::rngs::OsRng`
//!
//! CBC chaining is done in [`cipher`] so the record layer can carry the
//! chaining block between records.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use ltls_crypto::CryptoProvider;
//! use ltls_crypto_rustcrypto::RustCryptoProvider;
//!
//! let provider = RustCryptoProvider::new();
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unused_qualifications,
    missing_debug_implementations
)]

use ltls_crypto::{
    BulkCipher, BulkCipherAlgorithm, CryptoProvider, Hash, HashAlgorithm, Hmac, KeyExchange,
    Random, Result,
};

pub mod cipher;
pub mod hash;
pub mod hmac;
pub mod kex;
pub mod random;

use kex::RustCryptoKeyExchange;
use random::RustCryptoRandom;

/// Cryptography provider backed by the RustCrypto crates.
///
/// # Thread Safety
///
/// This provider is `Send + Sync` and can be shared across threads.
///
/// # Example
///
/// ```rust,no_run
/// use ltls_crypto::CryptoProvider;
/// use ltls_crypto_rustcrypto::RustCryptoProvider;
///
/// let provider = RustCryptoProvider::new();
/// let rng = provider.random();
/// ```
#[derive(Debug)]
pub struct RustCryptoProvider {
    /// Random number generator instance
    random: RustCryptoRandom,
    /// RSA / DH implementation
    key_exchange: RustCryptoKeyExchange,
}

impl Default for RustCryptoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoProvider for RustCryptoProvider {
    fn new() -> Self {
        Self {
            random: RustCryptoRandom,
            key_exchange: RustCryptoKeyExchange::new(RustCryptoRandom),
        }
    }

    fn hash(&self, algorithm: HashAlgorithm) -> Result<Box<dyn Hash>> {
        hash::create_hash(algorithm)
    }

    fn hmac(&self, algorithm: HashAlgorithm, key: &[u8]) -> Result<Box<dyn Hmac>> {
        hmac::create_hmac(algorithm, key)
    }

    fn cipher(
        &self,
        algorithm: BulkCipherAlgorithm,
        key: &[u8],
        iv: &[u8],
    ) -> Result<Box<dyn BulkCipher>> {
        cipher::create_cipher(algorithm, key, iv)
    }

    fn random(&self) -> &dyn Random {
        &self.random
    }

    fn key_exchange(&self) -> &dyn KeyExchange {
        &self.key_exchange
    }
}
