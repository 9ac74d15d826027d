//! Keyed MAC interface.

use crate::HashAlgorithm;

/// An HMAC computation in progress.
///
/// TLS 1.0-1.2 use HMAC twice: as the record MAC (keyed with the
/// per-direction MAC secret) and inside the P_hash expansion of the PRF.
/// Instances are created by [`CryptoProvider::hmac`](crate::CryptoProvider::hmac)
/// and consumed by `finalize`.
///
/// ```rust,ignore
/// let mut mac = provider.hmac(HashAlgorithm::Sha1, &mac_key)?;
/// mac.update(&sequence_number.to_be_bytes());
/// mac.update(&header);
/// mac.update(content);
/// let tag = mac.finalize();
/// ```
pub trait Hmac: Send {
    /// Absorb more input.
    fn update(&mut self, data: &[u8]);

    /// Produce the tag; `output_size()` bytes.
    fn finalize(self: Box<Self>) -> Vec<u8>;

    /// Compare the tag against `expected` without early exit.
    fn verify(self: Box<Self>, expected: &[u8]) -> bool {
        use subtle::ConstantTimeEq;
        self.finalize().ct_eq(expected).into()
    }

    /// Tag length in bytes.
    fn output_size(&self) -> usize;

    /// Underlying hash.
    fn algorithm(&self) -> HashAlgorithm;
}
