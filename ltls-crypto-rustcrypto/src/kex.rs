//! RSA encryption over the `rsa` crate and finite-field Diffie-Hellman
//! using `num-bigint`.

use ltls_crypto::{
    DhKeyPair, DhParameters, Error, KeyExchange, Random, Result, RsaPublicKey,
};
use num_bigint::BigUint;
use rand::rngs::OsRng;
use rsa::Pkcs1v15Encrypt;
use zeroize::Zeroizing;

use crate::random::RustCryptoRandom;

/// Smallest RSA modulus accepted, in bytes.
const MIN_RSA_MODULUS_SIZE: usize = 64;

/// Largest RSA modulus accepted, in bits.
const MAX_RSA_MODULUS_BITS: usize = 8192;

/// Smallest DH prime accepted, in bits.
const MIN_DH_PRIME_BITS: u64 = 512;

/// Key exchange implementation.
#[derive(Debug, Clone, Copy)]
pub struct RustCryptoKeyExchange {
    random: RustCryptoRandom,
}

impl RustCryptoKeyExchange {
    /// Create a key exchange implementation drawing randomness from `random`.
    pub fn new(random: RustCryptoRandom) -> Self {
        Self { random }
    }
}

/// Big-endian encoding left-padded with zeros to exactly `len` bytes.
fn to_fixed_len(value: &BigUint, len: usize) -> Result<Vec<u8>> {
    let bytes = value.to_bytes_be();
    if bytes.len() > len {
        return Err(Error::CryptoError("integer wider than modulus".into()));
    }
    let mut out = vec![0u8; len - bytes.len()];
    out.extend_from_slice(&bytes);
    Ok(out)
}

impl KeyExchange for RustCryptoKeyExchange {
    fn rsa_encrypt_pkcs1(&self, key: &RsaPublicKey, message: &[u8]) -> Result<Vec<u8>> {
        if key.size() < MIN_RSA_MODULUS_SIZE {
            return Err(Error::InvalidPublicKey);
        }
        let public_key = rsa::RsaPublicKey::new_with_max_size(
            rsa::BigUint::from_bytes_be(&key.modulus),
            rsa::BigUint::from_bytes_be(&key.exponent),
            MAX_RSA_MODULUS_BITS,
        )
        .map_err(|_| Error::InvalidPublicKey)?;

        public_key
            .encrypt(&mut OsRng, Pkcs1v15Encrypt, message)
            .map_err(|e| match e {
                rsa::Error::MessageTooLong => Error::MessageTooLong,
                e => Error::CryptoError(format!("RSA encryption failed: {}", e)),
            })
    }

    fn dh_generate_key_pair(&self, params: &DhParameters) -> Result<DhKeyPair> {
        let p = BigUint::from_bytes_be(&params.p);
        let g = BigUint::from_bytes_be(&params.g);
        if p.bits() < MIN_DH_PRIME_BITS {
            return Err(Error::InvalidParameters(format!(
                "DH prime too small: {} bits",
                p.bits()
            )));
        }
        let two = BigUint::from(2u32);
        if g < two || g >= p {
            return Err(Error::InvalidParameters("DH generator out of range".into()));
        }

        // x uniformly-ish in [2, p - 2]
        let p_len = params.p.len();
        let raw = Zeroizing::new(self.random.generate(p_len)?);
        let range = &p - BigUint::from(3u32);
        let x = BigUint::from_bytes_be(&raw) % &range + &two;

        let y = g.modpow(&x, &p);
        Ok(DhKeyPair {
            private_key: Zeroizing::new(to_fixed_len(&x, p_len)?),
            public_key: to_fixed_len(&y, p_len)?,
        })
    }

    fn dh_compute_shared_secret(
        &self,
        params: &DhParameters,
        private_key: &[u8],
        peer_public_key: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        let p = BigUint::from_bytes_be(&params.p);
        let y = BigUint::from_bytes_be(peer_public_key);
        let one = BigUint::from(1u32);
        if y <= one || y >= &p - &one {
            return Err(Error::InvalidPublicKey);
        }

        let x = BigUint::from_bytes_be(private_key);
        if x == BigUint::from(0u32) {
            return Err(Error::InvalidPrivateKey);
        }

        let z = y.modpow(&x, &p);
        Ok(Zeroizing::new(z.to_bytes_be()))
    }
}
