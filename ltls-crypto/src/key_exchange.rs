//! Key exchange interface: RSA key transport and finite-field Diffie-Hellman.
//!
//! All integers are big-endian unsigned byte strings, the form they take
//! on the wire and inside certificates.

use zeroize::Zeroizing;

use crate::Result;

/// RSA public key extracted from a server certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPublicKey {
    /// Modulus `n`, big-endian, without a leading zero byte.
    pub modulus: Vec<u8>,
    /// Public exponent `e`, big-endian.
    pub exponent: Vec<u8>,
}

impl RsaPublicKey {
    /// Create a key from big-endian components.
    ///
    /// Leading zero bytes are stripped from both components.
    pub fn new(modulus: &[u8], exponent: &[u8]) -> Self {
        Self {
            modulus: strip_leading_zeros(modulus).to_vec(),
            exponent: strip_leading_zeros(exponent).to_vec(),
        }
    }

    /// Size of the modulus in bytes (the RSA ciphertext length).
    pub fn size(&self) -> usize {
        self.modulus.len()
    }
}

/// Server-chosen Diffie-Hellman group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhParameters {
    /// Prime modulus `p`.
    pub p: Vec<u8>,
    /// Generator `g`.
    pub g: Vec<u8>,
}

/// Ephemeral DH key pair.
#[derive(Debug)]
pub struct DhKeyPair {
    /// Private exponent.
    pub private_key: Zeroizing<Vec<u8>>,
    /// Public value `g^x mod p`, left-padded to the length of `p`.
    pub public_key: Vec<u8>,
}

/// Key exchange primitives.
pub trait KeyExchange: Send + Sync {
    /// RSAES-PKCS1-v1_5 encryption (RFC 8017 Section 7.2.1).
    ///
    /// Returns a ciphertext exactly `key.size()` bytes long.
    fn rsa_encrypt_pkcs1(&self, key: &RsaPublicKey, message: &[u8]) -> Result<Vec<u8>>;

    /// Generate an ephemeral key pair in the given group.
    fn dh_generate_key_pair(&self, params: &DhParameters) -> Result<DhKeyPair>;

    /// Compute the shared secret `peer_public^private mod p`.
    ///
    /// Leading zero bytes are stripped, as TLS requires for the DH
    /// pre-master secret (RFC 5246 Section 8.1.2).
    fn dh_compute_shared_secret(
        &self,
        params: &DhParameters,
        private_key: &[u8],
        peer_public_key: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>>;
}

/// Remove leading zero bytes from a big-endian integer.
pub fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}
