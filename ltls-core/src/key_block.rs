//! Key block partitioning.
//!
//! ```text
//! client_write_MAC_key[mac_size]
//! server_write_MAC_key[mac_size]
//! client_write_key[key_size]
//! server_write_key[key_size]
//! client_write_IV[iv_size]      -- TLS 1.0 block ciphers only
//! server_write_IV[iv_size]      -- TLS 1.0 block ciphers only
//! ```

use zeroize::Zeroizing;

use crate::cipher_suites::CipherSuite;
use crate::error::{Error, Result};
use crate::protocol::ProtocolVersion;

/// Per-direction keys cut from the key block.
///
/// All buffers are wiped on drop.
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    /// Client write MAC key
    pub client_mac_key: Zeroizing<Vec<u8>>,
    /// Server write MAC key
    pub server_mac_key: Zeroizing<Vec<u8>>,
    /// Client write cipher key
    pub client_key: Zeroizing<Vec<u8>>,
    /// Server write cipher key
    pub server_key: Zeroizing<Vec<u8>>,
    /// Client write IV (empty unless implicit)
    pub client_iv: Zeroizing<Vec<u8>>,
    /// Server write IV (empty unless implicit)
    pub server_iv: Zeroizing<Vec<u8>>,
}

impl KeyMaterial {
    /// Split a key block into its six parts.
    ///
    /// The block must be exactly `suite.key_block_length(version)` bytes.
    pub fn split(key_block: &[u8], suite: &CipherSuite, version: ProtocolVersion) -> Result<Self> {
        let expected = suite.key_block_length(version);
        if key_block.len() != expected {
            return Err(Error::InternalError(format!(
                "key block is {} bytes, {} needs {}",
                key_block.len(),
                suite.name,
                expected
            )));
        }

        let mac = suite.mac_size();
        let key = suite.key_size();
        let iv = if suite.is_block_cipher() && !version.has_explicit_iv() {
            suite.iv_size()
        } else {
            0
        };

        let mut rest: &[u8] = key_block;
        let mut take = |len: usize| {
            let current = rest;
            let (head, tail) = current.split_at(len);
            rest = tail;
            Zeroizing::new(head.to_vec())
        };

        Ok(Self {
            client_mac_key: take(mac),
            server_mac_key: take(mac),
            client_key: take(key),
            server_key: take(key),
            client_iv: take(iv),
            server_iv: take(iv),
        })
    }
}
