//! Record protection for TLS 1.0-1.2 (RFC 5246 Section 6.2.3).
//!
//! MAC-then-encrypt with either a stream or a CBC block cipher:
//!
//! ```text
//! MAC = HMAC(mac_key, seq_num(8) + type(1) + version(2) + length(2) + content)
//!
//! stream:  ENC(content + MAC)
//! block:   [IV] + ENC(content + MAC + padding + padding_length)
//! ```
//!
//! The explicit per-record IV exists from TLS 1.1 on. TLS 1.0 chains the
//! IV implicitly: the cipher keeps the last ciphertext block of the
//! previous record as the next IV.
//!
//! Every decryption failure (short record, bad padding, bad MAC) is
//! reported as the same [`Error::DecryptionFailed`], and the MAC is
//! computed even when the padding is already known to be wrong.

use ltls_crypto::{BulkCipher, CryptoProvider, HashAlgorithm};
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroizing;

use crate::cipher_suites::CipherSuite;
use crate::error::{Error, ProtocolError, Result};
use crate::protocol::{ContentType, ProtocolVersion};
use crate::record::{MAX_CIPHERTEXT_SIZE, MAX_FRAGMENT_SIZE};

/// Protection state for one direction of a connection.
pub struct RecordProtection {
    /// Negotiated protocol version (MAC input and IV handling)
    version: ProtocolVersion,
    /// Record MAC hash
    mac_algorithm: HashAlgorithm,
    /// MAC key
    mac_key: Zeroizing<Vec<u8>>,
    /// Keyed bulk cipher (carries the CBC chain or RC4 state)
    cipher: Box<dyn BulkCipher>,
    /// Cipher block size, zero for stream ciphers
    block_size: usize,
    /// Sequence number of the next record
    sequence_number: u64,
}

impl std::fmt::Debug for RecordProtection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordProtection")
            .field("version", &self.version)
            .field("mac_algorithm", &self.mac_algorithm)
            .field("cipher", &self.cipher.algorithm())
            .field("sequence_number", &self.sequence_number)
            .finish_non_exhaustive()
    }
}

impl RecordProtection {
    /// Create protection state for one direction.
    ///
    /// # Arguments
    /// * `provider` - Crypto provider that keys the cipher
    /// * `suite` - Negotiated cipher suite
    /// * `version` - Negotiated protocol version
    /// * `mac_key` - Write MAC key for this direction
    /// * `key` - Write cipher key for this direction
    /// * `iv` - Implicit IV (TLS 1.0 block ciphers), empty otherwise
    pub fn new(
        provider: &dyn CryptoProvider,
        suite: &CipherSuite,
        version: ProtocolVersion,
        mac_key: &[u8],
        key: &[u8],
        iv: &[u8],
    ) -> Result<Self> {
        let block_size = if suite.is_block_cipher() {
            suite.block_size()
        } else {
            0
        };

        let initial_iv: Zeroizing<Vec<u8>> = if block_size == 0 {
            Zeroizing::new(Vec::new())
        } else if version.has_explicit_iv() {
            // Replaced by the explicit IV of every record.
            Zeroizing::new(vec![0u8; block_size])
        } else {
            Zeroizing::new(iv.to_vec())
        };

        let cipher = provider.cipher(suite.cipher, key, &initial_iv)?;

        Ok(Self {
            version,
            mac_algorithm: suite.mac,
            mac_key: Zeroizing::new(mac_key.to_vec()),
            cipher,
            block_size,
            sequence_number: 0,
        })
    }

    /// Sequence number of the next record.
    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    /// MAC tag length.
    pub fn mac_size(&self) -> usize {
        self.mac_algorithm.output_size()
    }

    fn compute_mac(
        &self,
        provider: &dyn CryptoProvider,
        content_type: ContentType,
        content: &[u8],
    ) -> Result<Vec<u8>> {
        let mut hmac = provider.hmac(self.mac_algorithm, &self.mac_key)?;
        hmac.update(&self.sequence_number.to_be_bytes());
        hmac.update(&[content_type.to_u8()]);
        hmac.update(&self.version.to_bytes());
        hmac.update(&(content.len() as u16).to_be_bytes());
        hmac.update(content);
        Ok(hmac.finalize())
    }

    fn advance_sequence(&mut self) -> Result<()> {
        self.sequence_number = self
            .sequence_number
            .checked_add(1)
            .ok_or_else(|| Error::InternalError("Sequence number overflow".to_string()))?;
        Ok(())
    }

    /// Protect one record fragment.
    ///
    /// Returns the fragment to place in a record of `content_type`.
    pub fn encrypt(
        &mut self,
        provider: &dyn CryptoProvider,
        content_type: ContentType,
        content: &[u8],
    ) -> Result<Vec<u8>> {
        if content.len() > MAX_FRAGMENT_SIZE {
            return Err(Error::ProtocolError(ProtocolError::RecordOverflow));
        }

        let mac = self.compute_mac(provider, content_type, content)?;

        let mut data = Vec::with_capacity(content.len() + mac.len() + 2 * self.block_size + 1);
        data.extend_from_slice(content);
        data.extend_from_slice(&mac);

        let fragment = if self.block_size == 0 {
            self.cipher.encrypt(&mut data)?;
            data
        } else {
            // padding_length + 1 bytes, each equal to padding_length
            let pad_len = self.block_size - 1 - (data.len() % self.block_size);
            data.resize(data.len() + pad_len + 1, pad_len as u8);

            if self.version.has_explicit_iv() {
                let mut iv = vec![0u8; self.block_size];
                provider.random().fill(&mut iv)?;
                self.cipher.set_iv(&iv)?;
                self.cipher.encrypt(&mut data)?;
                iv.extend_from_slice(&data);
                iv
            } else {
                self.cipher.encrypt(&mut data)?;
                data
            }
        };

        self.advance_sequence()?;
        Ok(fragment)
    }

    /// Remove protection from one record fragment.
    pub fn decrypt(
        &mut self,
        provider: &dyn CryptoProvider,
        content_type: ContentType,
        fragment: &[u8],
    ) -> Result<Vec<u8>> {
        if fragment.len() > MAX_CIPHERTEXT_SIZE {
            return Err(Error::ProtocolError(ProtocolError::RecordOverflow));
        }

        let mac_size = self.mac_size();
        let content = if self.block_size == 0 {
            self.open_stream(provider, content_type, fragment, mac_size)?
        } else {
            self.open_block(provider, content_type, fragment, mac_size)?
        };

        if content.len() > MAX_FRAGMENT_SIZE {
            return Err(Error::ProtocolError(ProtocolError::RecordOverflow));
        }
        self.advance_sequence()?;
        Ok(content)
    }

    fn open_stream(
        &mut self,
        provider: &dyn CryptoProvider,
        content_type: ContentType,
        fragment: &[u8],
        mac_size: usize,
    ) -> Result<Vec<u8>> {
        if fragment.len() < mac_size {
            return Err(Error::DecryptionFailed);
        }

        let mut data = fragment.to_vec();
        self.cipher.decrypt(&mut data)?;

        let content_len = data.len() - mac_size;
        let expected = self.compute_mac(provider, content_type, &data[..content_len])?;
        if bool::from(expected.ct_eq(&data[content_len..])) {
            data.truncate(content_len);
            Ok(data)
        } else {
            Err(Error::DecryptionFailed)
        }
    }

    fn open_block(
        &mut self,
        provider: &dyn CryptoProvider,
        content_type: ContentType,
        fragment: &[u8],
        mac_size: usize,
    ) -> Result<Vec<u8>> {
        let bs = self.block_size;
        let body = if self.version.has_explicit_iv() {
            if fragment.len() < bs {
                return Err(Error::DecryptionFailed);
            }
            let (iv, body) = fragment.split_at(bs);
            self.cipher.set_iv(iv)?;
            body
        } else {
            fragment
        };

        // At least the MAC and the padding_length byte, in whole blocks.
        if body.is_empty() || body.len() % bs != 0 || body.len() < mac_size + 1 {
            return Err(Error::DecryptionFailed);
        }

        let mut data = body.to_vec();
        self.cipher.decrypt(&mut data)?;

        let len = data.len();
        let claimed = usize::from(data[len - 1]);
        let fits = Choice::from(u8::from(claimed + 1 + mac_size <= len));

        // Check every padding byte, treating an impossible length as zero
        // so the MAC below still runs over a well-defined range.
        let pad_len = if bool::from(fits) { claimed } else { 0 };
        let mut pad_ok = fits;
        for &b in &data[len - 1 - pad_len..len - 1] {
            pad_ok &= b.ct_eq(&(pad_len as u8));
        }
        let pad_len = if bool::from(pad_ok) { pad_len } else { 0 };

        let content_len = len - 1 - pad_len - mac_size;
        let expected = self.compute_mac(provider, content_type, &data[..content_len])?;
        let mac_ok = expected.ct_eq(&data[content_len..content_len + mac_size]);

        if bool::from(pad_ok & mac_ok) {
            data.truncate(content_len);
            Ok(data)
        } else {
            Err(Error::DecryptionFailed)
        }
    }
}
