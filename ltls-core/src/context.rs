//! Per-connection mutable state.
//!
//! The context is owned by exactly one [`ClientConnection`] and is never
//! shared. Secrets are held in [`Zeroizing`] buffers; [`ConnectionContext::dispose`]
//! drops them together with both cipher states.
//!
//! [`ClientConnection`]: crate::client::ClientConnection

use ltls_crypto::{DhParameters, RsaPublicKey};
use zeroize::Zeroizing;

use crate::cipher_suites::CipherSuite;
use crate::key_block::KeyMaterial;
use crate::protocol::{ProtocolVersion, RANDOM_SIZE};
use crate::record_protection::RecordProtection;
use crate::transcript::Transcript;

/// Server DH parameters from ServerKeyExchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerDhParams {
    /// Group
    pub params: DhParameters,
    /// Server public value `Ys`
    pub public_value: Vec<u8>,
}

/// Everything the handshake learns and derives.
#[derive(Debug)]
pub struct ConnectionContext {
    /// Lowest version offered
    pub min_version: ProtocolVersion,
    /// Highest version offered (sent in ClientHello)
    pub max_version: ProtocolVersion,
    /// Version chosen by the server
    pub version: Option<ProtocolVersion>,

    /// Client random
    pub client_random: [u8; RANDOM_SIZE],
    /// Server random
    pub server_random: [u8; RANDOM_SIZE],
    /// Session id from ServerHello
    pub session_id: Vec<u8>,

    /// Negotiated cipher suite
    pub cipher_suite: Option<&'static CipherSuite>,

    /// Pre-master secret
    pub pre_master_secret: Option<Zeroizing<Vec<u8>>>,
    /// Master secret
    pub master_secret: Option<Zeroizing<Vec<u8>>>,
    /// Raw key block
    pub key_block: Option<Zeroizing<Vec<u8>>>,
    /// Key block split into per-direction keys, until installed
    pub pending_keys: Option<KeyMaterial>,

    /// Server certificate chain, leaf first
    pub server_certificates: Vec<Vec<u8>>,
    /// RSA key from the leaf certificate
    pub server_public_key: Option<RsaPublicKey>,
    /// DH parameters from ServerKeyExchange
    pub server_dh: Option<ServerDhParams>,

    /// Handshake transcript
    pub transcript: Transcript,

    /// Read-direction protection, once the server's ChangeCipherSpec arrives
    pub read_protection: Option<RecordProtection>,
    /// Write-direction protection, once our ChangeCipherSpec is sent
    pub write_protection: Option<RecordProtection>,

    disposed: bool,
}

impl ConnectionContext {
    /// Fresh context for a connection offering `min_version..=max_version`.
    pub fn new(min_version: ProtocolVersion, max_version: ProtocolVersion) -> Self {
        Self {
            min_version,
            max_version,
            version: None,
            client_random: [0u8; RANDOM_SIZE],
            server_random: [0u8; RANDOM_SIZE],
            session_id: Vec::new(),
            cipher_suite: None,
            pre_master_secret: None,
            master_secret: None,
            key_block: None,
            pending_keys: None,
            server_certificates: Vec::new(),
            server_public_key: None,
            server_dh: None,
            transcript: Transcript::new(),
            read_protection: None,
            write_protection: None,
            disposed: false,
        }
    }

    /// Sequence number of the next record read (zero before encryption).
    pub fn seq_read(&self) -> u64 {
        self.read_protection
            .as_ref()
            .map_or(0, RecordProtection::sequence_number)
    }

    /// Sequence number of the next record written (zero before encryption).
    pub fn seq_write(&self) -> u64 {
        self.write_protection
            .as_ref()
            .map_or(0, RecordProtection::sequence_number)
    }

    /// Inbound records are protected.
    pub fn is_read_encrypted(&self) -> bool {
        self.read_protection.is_some()
    }

    /// Outbound records are protected.
    pub fn is_write_encrypted(&self) -> bool {
        self.write_protection.is_some()
    }

    /// Drop handshake-only secrets once the handshake completes.
    ///
    /// The master secret is kept no longer than needed: with no session
    /// resumption nothing uses it after the server Finished is verified.
    pub fn clear_handshake_secrets(&mut self) {
        self.pre_master_secret = None;
        self.master_secret = None;
        self.key_block = None;
        self.pending_keys = None;
        self.transcript.clear();
    }

    /// Release all key material and both cipher states.
    ///
    /// Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.clear_handshake_secrets();
        self.read_protection = None;
        self.write_protection = None;
        self.server_dh = None;
        self.disposed = true;
    }

    /// True after [`dispose`](Self::dispose).
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher_suites::lookup;
    use ltls_crypto::CryptoProvider;
    use ltls_crypto_rustcrypto::RustCryptoProvider;

    #[test]
    fn test_new_context_is_plaintext() {
        let ctx = ConnectionContext::new(ProtocolVersion::Tls10, ProtocolVersion::Tls12);
        assert!(!ctx.is_read_encrypted());
        assert!(!ctx.is_write_encrypted());
        assert_eq!(ctx.seq_read(), 0);
        assert_eq!(ctx.seq_write(), 0);
        assert_eq!(ctx.version, None);
    }

    #[test]
    fn test_dispose_releases_everything() {
        let provider = RustCryptoProvider::new();
        let suite = lookup(0x0005).unwrap();
        let mut ctx = ConnectionContext::new(ProtocolVersion::Tls10, ProtocolVersion::Tls12);
        ctx.master_secret = Some(Zeroizing::new(vec![1; 48]));
        ctx.transcript.update(b"hello");
        ctx.write_protection = Some(
            RecordProtection::new(
                &provider,
                suite,
                ProtocolVersion::Tls10,
                &[0; 20],
                &[0; 16],
                &[],
            )
            .unwrap(),
        );
        assert!(ctx.is_write_encrypted());

        ctx.dispose();
        assert!(ctx.is_disposed());
        assert!(ctx.master_secret.is_none());
        assert!(ctx.transcript.is_empty());
        assert!(!ctx.is_write_encrypted());

        // second call is a no-op
        ctx.dispose();
        assert!(ctx.is_disposed());
    }
}
