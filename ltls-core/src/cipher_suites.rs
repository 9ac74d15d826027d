//! Cipher suite registry.
//!
//! A TLS 1.0-1.2 cipher suite names the complete set of algorithms:
//! - Key exchange (RSA key transport, or ephemeral DH signed by DSS/RSA)
//! - Bulk cipher (RC4 stream cipher, AES in CBC mode)
//! - Record MAC hash (MD5, SHA-1, SHA-256)
//!
//! Format: TLS_{KeyExchange}_WITH_{Cipher}_{Mac}
//!
//! The registry is a compile-time table; [`lookup`] is the only way the
//! engine turns a wire id into a descriptor.

use ltls_crypto::{BulkCipherAlgorithm, CipherType, HashAlgorithm};

use crate::error::{Error, Result};
use crate::protocol::ProtocolVersion;

/// Key exchange method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyExchangeAlgorithm {
    /// RSA key transport: the pre-master secret is encrypted to the
    /// certificate's public key.
    Rsa,
    /// Ephemeral Diffie-Hellman, parameters signed with DSS.
    DheDss,
    /// Ephemeral Diffie-Hellman, parameters signed with RSA.
    DheRsa,
}

impl KeyExchangeAlgorithm {
    /// True for the DHE variants, which send a ServerKeyExchange.
    pub const fn is_ephemeral_dh(self) -> bool {
        matches!(self, KeyExchangeAlgorithm::DheDss | KeyExchangeAlgorithm::DheRsa)
    }
}

/// Cipher suite descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CipherSuite {
    /// IANA identifier
    pub id: u16,
    /// IANA name
    pub name: &'static str,
    /// Key exchange method
    pub key_exchange: KeyExchangeAlgorithm,
    /// Bulk cipher
    pub cipher: BulkCipherAlgorithm,
    /// Record MAC hash
    pub mac: HashAlgorithm,
    /// Lowest protocol version the suite may be negotiated at
    pub min_version: ProtocolVersion,
}

impl CipherSuite {
    const fn new(
        id: u16,
        name: &'static str,
        key_exchange: KeyExchangeAlgorithm,
        cipher: BulkCipherAlgorithm,
        mac: HashAlgorithm,
    ) -> Self {
        let min_version = match mac {
            HashAlgorithm::Sha256 => ProtocolVersion::Tls12,
            _ => ProtocolVersion::Tls10,
        };
        Self {
            id,
            name,
            key_exchange,
            cipher,
            mac,
            min_version,
        }
    }

    /// Cipher key size in bytes.
    pub const fn key_size(&self) -> usize {
        self.cipher.key_size()
    }

    /// IV size in bytes (zero for RC4).
    pub const fn iv_size(&self) -> usize {
        self.cipher.iv_size()
    }

    /// Block size in bytes (zero for RC4).
    pub const fn block_size(&self) -> usize {
        self.cipher.block_size()
    }

    /// MAC key and tag size in bytes.
    pub const fn mac_size(&self) -> usize {
        self.mac.output_size()
    }

    /// True for CBC suites.
    pub const fn is_block_cipher(&self) -> bool {
        matches!(self.cipher.cipher_type(), CipherType::Block)
    }

    /// Whether the suite may be used at `version`.
    pub fn supports_version(&self, version: ProtocolVersion) -> bool {
        version >= self.min_version
    }

    /// Length of the key block derived for this suite.
    ///
    /// `2 * (mac + key)`, plus `2 * iv` only for block ciphers at TLS 1.0,
    /// where the IV is implicit. Later versions send an explicit IV in
    /// every record.
    pub const fn key_block_length(&self, version: ProtocolVersion) -> usize {
        let mut len = 2 * (self.mac_size() + self.key_size());
        if self.is_block_cipher() && !version.has_explicit_iv() {
            len += 2 * self.iv_size();
        }
        len
    }
}

use BulkCipherAlgorithm::{Aes128Cbc, Aes256Cbc, Rc4_128};
use HashAlgorithm::{Md5, Sha1, Sha256};
use KeyExchangeAlgorithm::{DheDss, DheRsa, Rsa};

/// Every suite the engine can negotiate.
pub const CIPHER_SUITES: &[CipherSuite] = &[
    CipherSuite::new(0x0004, "TLS_RSA_WITH_RC4_128_MD5", Rsa, Rc4_128, Md5),
    CipherSuite::new(0x0005, "TLS_RSA_WITH_RC4_128_SHA", Rsa, Rc4_128, Sha1),
    CipherSuite::new(0x002F, "TLS_RSA_WITH_AES_128_CBC_SHA", Rsa, Aes128Cbc, Sha1),
    CipherSuite::new(0x0032, "TLS_DHE_DSS_WITH_AES_128_CBC_SHA", DheDss, Aes128Cbc, Sha1),
    CipherSuite::new(0x0033, "TLS_DHE_RSA_WITH_AES_128_CBC_SHA", DheRsa, Aes128Cbc, Sha1),
    CipherSuite::new(0x0035, "TLS_RSA_WITH_AES_256_CBC_SHA", Rsa, Aes256Cbc, Sha1),
    CipherSuite::new(0x0038, "TLS_DHE_DSS_WITH_AES_256_CBC_SHA", DheDss, Aes256Cbc, Sha1),
    CipherSuite::new(0x0039, "TLS_DHE_RSA_WITH_AES_256_CBC_SHA", DheRsa, Aes256Cbc, Sha1),
    CipherSuite::new(0x003C, "TLS_RSA_WITH_AES_128_CBC_SHA256", Rsa, Aes128Cbc, Sha256),
    CipherSuite::new(0x003D, "TLS_RSA_WITH_AES_256_CBC_SHA256", Rsa, Aes256Cbc, Sha256),
    CipherSuite::new(0x0040, "TLS_DHE_DSS_WITH_AES_128_CBC_SHA256", DheDss, Aes128Cbc, Sha256),
    CipherSuite::new(0x0067, "TLS_DHE_RSA_WITH_AES_128_CBC_SHA256", DheRsa, Aes128Cbc, Sha256),
    CipherSuite::new(0x006A, "TLS_DHE_DSS_WITH_AES_256_CBC_SHA256", DheDss, Aes256Cbc, Sha256),
    CipherSuite::new(0x006B, "TLS_DHE_RSA_WITH_AES_256_CBC_SHA256", DheRsa, Aes256Cbc, Sha256),
];

/// Look up a cipher suite by its wire id.
pub fn lookup(id: u16) -> Result<&'static CipherSuite> {
    CIPHER_SUITES
        .iter()
        .find(|suite| suite.id == id)
        .ok_or(Error::UnknownCipherSuite(id))
}

/// Default offer order: DHE before RSA, SHA-256 before SHA-1, AES-256
/// before AES-128, RC4 last.
pub fn default_cipher_suites() -> Vec<u16> {
    vec![
        0x006B, 0x0067, 0x006A, 0x0040, // DHE, SHA-256
        0x0039, 0x0033, 0x0038, 0x0032, // DHE, SHA-1
        0x003D, 0x003C, // RSA, SHA-256
        0x0035, 0x002F, // RSA, SHA-1
        0x0005, 0x0004, // RC4
    ]
}
