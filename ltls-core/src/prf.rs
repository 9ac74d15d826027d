//! TLS pseudorandom function and key schedule (RFC 2246 Section 5,
//! RFC 5246 Section 5).
//!
//! ```text
//! P_hash(secret, seed) = HMAC_hash(secret, A(1) + seed) +
//!                        HMAC_hash(secret, A(2) + seed) + ...
//! A(0) = seed
//! A(i) = HMAC_hash(secret, A(i-1))
//!
//! TLS 1.0/1.1:  PRF = P_MD5(S1, label + seed) XOR P_SHA1(S2, label + seed)
//! TLS 1.2:      PRF = P_SHA256(secret, label + seed)
//! ```
//!
//! S1 and S2 are the first and last `ceil(len / 2)` bytes of the secret;
//! they share the middle byte when the secret length is odd.

use ltls_crypto::{CryptoProvider, HashAlgorithm};
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::protocol::{ProtocolVersion, RANDOM_SIZE};

/// Length of the master secret.
pub const MASTER_SECRET_LENGTH: usize = 48;

/// Length of Finished verify data.
pub const VERIFY_DATA_LENGTH: usize = 12;

/// Label for the master secret derivation.
pub const MASTER_SECRET_LABEL: &[u8] = b"master secret";

/// Label for the key block derivation.
pub const KEY_EXPANSION_LABEL: &[u8] = b"key expansion";

/// Label for the client Finished message.
pub const CLIENT_FINISHED_LABEL: &[u8] = b"client finished";

/// Label for the server Finished message.
pub const SERVER_FINISHED_LABEL: &[u8] = b"server finished";

/// Version-dependent PRF.
pub struct Prf<'a> {
    provider: &'a dyn CryptoProvider,
    version: ProtocolVersion,
}

impl std::fmt::Debug for Prf<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prf").field("version", &self.version).finish()
    }
}

impl<'a> Prf<'a> {
    /// Create a PRF for the negotiated version.
    pub fn new(provider: &'a dyn CryptoProvider, version: ProtocolVersion) -> Self {
        Self { provider, version }
    }

    /// Compute `PRF(secret, label, seed)` truncated to `output_len` bytes.
    ///
    /// # Arguments
    /// * `secret` - Secret key material
    /// * `label` - ASCII label, e.g. `b"master secret"`
    /// * `seed` - Seed bytes (usually a concatenation of the randoms)
    /// * `output_len` - Number of bytes to produce
    pub fn compute(
        &self,
        secret: &[u8],
        label: &[u8],
        seed: &[u8],
        output_len: usize,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let mut label_seed = Vec::with_capacity(label.len() + seed.len());
        label_seed.extend_from_slice(label);
        label_seed.extend_from_slice(seed);

        if self.version.uses_sha256_prf() {
            return self.p_hash(HashAlgorithm::Sha256, secret, &label_seed, output_len);
        }

        let half = (secret.len() + 1) / 2;
        let s1 = &secret[..half];
        let s2 = &secret[secret.len() - half..];

        let mut output = self.p_hash(HashAlgorithm::Md5, s1, &label_seed, output_len)?;
        let sha1 = self.p_hash(HashAlgorithm::Sha1, s2, &label_seed, output_len)?;
        for (out, b) in output.iter_mut().zip(sha1.iter()) {
            *out ^= b;
        }
        Ok(output)
    }

    /// `P_hash(secret, seed)` expanded to `output_len` bytes.
    fn p_hash(
        &self,
        algorithm: HashAlgorithm,
        secret: &[u8],
        seed: &[u8],
        output_len: usize,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let mut output = Zeroizing::new(Vec::with_capacity(output_len + algorithm.output_size()));

        // A(0) = seed
        let mut a = Zeroizing::new(seed.to_vec());

        while output.len() < output_len {
            // A(i) = HMAC(secret, A(i-1))
            let mut hmac = self.provider.hmac(algorithm, secret)?;
            hmac.update(&a);
            a = Zeroizing::new(hmac.finalize());

            let mut hmac = self.provider.hmac(algorithm, secret)?;
            hmac.update(&a);
            hmac.update(seed);
            output.extend_from_slice(&hmac.finalize());
        }

        output.truncate(output_len);
        Ok(output)
    }
}

/// Derive the 48-byte master secret.
///
/// `master_secret = PRF(pre_master_secret, "master secret",
///                      client_random + server_random)[0..47]`
pub fn compute_master_secret(
    provider: &dyn CryptoProvider,
    version: ProtocolVersion,
    pre_master_secret: &[u8],
    client_random: &[u8],
    server_random: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    if client_random.len() != RANDOM_SIZE || server_random.len() != RANDOM_SIZE {
        return Err(Error::InternalError(format!(
            "randoms must be {} bytes, got {} and {}",
            RANDOM_SIZE,
            client_random.len(),
            server_random.len()
        )));
    }

    let mut seed = [0u8; 2 * RANDOM_SIZE];
    seed[..RANDOM_SIZE].copy_from_slice(client_random);
    seed[RANDOM_SIZE..].copy_from_slice(server_random);

    Prf::new(provider, version).compute(
        pre_master_secret,
        MASTER_SECRET_LABEL,
        &seed,
        MASTER_SECRET_LENGTH,
    )
}

/// Derive the key block.
///
/// Note the seed order: server random first.
pub fn compute_key_block(
    provider: &dyn CryptoProvider,
    version: ProtocolVersion,
    master_secret: &[u8],
    client_random: &[u8],
    server_random: &[u8],
    length: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    let mut seed = Vec::with_capacity(client_random.len() + server_random.len());
    seed.extend_from_slice(server_random);
    seed.extend_from_slice(client_random);

    Prf::new(provider, version).compute(master_secret, KEY_EXPANSION_LABEL, &seed, length)
}

/// Compute Finished verify data over a transcript hash.
///
/// # Arguments
/// * `is_client` - Selects the `"client finished"` or `"server finished"` label
/// * `handshake_hash` - `MD5 + SHA1` of the transcript below TLS 1.2,
///   `SHA256` at TLS 1.2
pub fn compute_verify_data(
    provider: &dyn CryptoProvider,
    version: ProtocolVersion,
    master_secret: &[u8],
    is_client: bool,
    handshake_hash: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let label = if is_client {
        CLIENT_FINISHED_LABEL
    } else {
        SERVER_FINISHED_LABEL
    };
    Prf::new(provider, version).compute(master_secret, label, handshake_hash, VERIFY_DATA_LENGTH)
}
