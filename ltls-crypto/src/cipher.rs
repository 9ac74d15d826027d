//! Bulk cipher interface for record encryption.
//!
//! TLS 1.0-1.2 protect records with either a stream cipher (RC4) or a
//! block cipher in CBC mode. A [`BulkCipher`] instance is owned by one
//! direction of one connection and carries its running state between
//! records: the RC4 keystream position, or the CBC chaining block.

use crate::Result;

/// Whether a bulk cipher operates on a byte stream or on fixed blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherType {
    /// Stream cipher, no padding and no IV.
    Stream,
    /// Block cipher in CBC mode.
    Block,
}

/// Bulk encryption algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkCipherAlgorithm {
    /// RC4 with a 128-bit key
    Rc4_128,
    /// AES-128 in CBC mode
    Aes128Cbc,
    /// AES-256 in CBC mode
    Aes256Cbc,
}

impl BulkCipherAlgorithm {
    /// Key size in bytes.
    pub const fn key_size(self) -> usize {
        match self {
            BulkCipherAlgorithm::Rc4_128 => 16,
            BulkCipherAlgorithm::Aes128Cbc => 16,
            BulkCipherAlgorithm::Aes256Cbc => 32,
        }
    }

    /// Block size in bytes (zero for stream ciphers).
    pub const fn block_size(self) -> usize {
        match self {
            BulkCipherAlgorithm::Rc4_128 => 0,
            BulkCipherAlgorithm::Aes128Cbc | BulkCipherAlgorithm::Aes256Cbc => 16,
        }
    }

    /// IV size in bytes (zero for stream ciphers).
    pub const fn iv_size(self) -> usize {
        self.block_size()
    }

    /// Stream or block.
    pub const fn cipher_type(self) -> CipherType {
        match self {
            BulkCipherAlgorithm::Rc4_128 => CipherType::Stream,
            BulkCipherAlgorithm::Aes128Cbc | BulkCipherAlgorithm::Aes256Cbc => CipherType::Block,
        }
    }

    /// Get the name of this algorithm.
    pub const fn name(self) -> &'static str {
        match self {
            BulkCipherAlgorithm::Rc4_128 => "RC4-128",
            BulkCipherAlgorithm::Aes128Cbc => "AES-128-CBC",
            BulkCipherAlgorithm::Aes256Cbc => "AES-256-CBC",
        }
    }
}

/// Stateful bulk cipher bound to a key.
pub trait BulkCipher: Send {
    /// The algorithm this instance implements.
    fn algorithm(&self) -> BulkCipherAlgorithm;

    /// Encrypt `data` in place.
    ///
    /// For block ciphers the length must be a multiple of the block size;
    /// the chaining block is advanced to the last ciphertext block.
    fn encrypt(&mut self, data: &mut [u8]) -> Result<()>;

    /// Decrypt `data` in place.
    ///
    /// For block ciphers the length must be a multiple of the block size;
    /// the chaining block is advanced to the last ciphertext block.
    fn decrypt(&mut self, data: &mut [u8]) -> Result<()>;

    /// Replace the CBC chaining block.
    ///
    /// Used for the explicit per-record IV of TLS 1.1 and later. Stream
    /// ciphers reject a non-empty IV.
    fn set_iv(&mut self, iv: &[u8]) -> Result<()>;
}
