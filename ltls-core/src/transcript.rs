//! Handshake transcript.
//!
//! TLS 1.0-1.2 hash the transcript with a version-dependent construction
//! (MD5 + SHA-1 below 1.2, SHA-256 at 1.2), and the version is not known
//! until ServerHello arrives. The transcript therefore keeps the raw
//! message bytes and hashes them on demand.

use ltls_crypto::{CryptoProvider, HashAlgorithm};
use zeroize::Zeroize;

use crate::error::Result;
use crate::protocol::ProtocolVersion;

/// Concatenation of every handshake message (header included) sent or
/// received so far.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<u8>,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an encoded handshake message.
    ///
    /// # Arguments
    /// * `message` - Handshake message bytes including the 4-byte header
    pub fn update(&mut self, message: &[u8]) {
        self.messages.extend_from_slice(message);
    }

    /// Raw transcript bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.messages
    }

    /// Number of bytes recorded.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True if no message has been recorded.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Hash input for Finished verify data.
    ///
    /// `MD5(transcript) + SHA1(transcript)` (36 bytes) below TLS 1.2,
    /// `SHA256(transcript)` at TLS 1.2.
    pub fn finished_hash(
        &self,
        provider: &dyn CryptoProvider,
        version: ProtocolVersion,
    ) -> Result<Vec<u8>> {
        if version.uses_sha256_prf() {
            return self.digest(provider, HashAlgorithm::Sha256);
        }
        let mut out = self.digest(provider, HashAlgorithm::Md5)?;
        out.extend(self.digest(provider, HashAlgorithm::Sha1)?);
        Ok(out)
    }

    fn digest(&self, provider: &dyn CryptoProvider, algorithm: HashAlgorithm) -> Result<Vec<u8>> {
        let mut hash = provider.hash(algorithm)?;
        hash.update(&self.messages);
        Ok(hash.finalize())
    }

    /// Wipe and drop the recorded messages.
    pub fn clear(&mut self) {
        self.messages.zeroize();
    }
}
