//! Cryptographically secure random number generation using the OS RNG.

use ltls_crypto::{Error, Random, Result};
use rand::rngs::OsRng;
use rand::RngCore;

/// Random number generator backed by [`OsRng`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoRandom;

impl Random for RustCryptoRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|_| Error::RandomGenerationFailed)
    }
}
