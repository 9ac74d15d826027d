//! Hash function implementations using the RustCrypto digest crates.

use ltls_crypto::{Hash, HashAlgorithm, Result};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Create a hash instance for the specified algorithm.
pub fn create_hash(algorithm: HashAlgorithm) -> Result<Box<dyn Hash>> {
    match algorithm {
        HashAlgorithm::Md5 => Ok(Box::new(DigestHash::<Md5>::new(algorithm))),
        HashAlgorithm::Sha1 => Ok(Box::new(DigestHash::<Sha1>::new(algorithm))),
        HashAlgorithm::Sha256 => Ok(Box::new(DigestHash::<Sha256>::new(algorithm))),
    }
}

/// Adapter from a RustCrypto [`Digest`] to the provider [`Hash`] trait.
struct DigestHash<D> {
    hasher: D,
    algorithm: HashAlgorithm,
}

impl<D: Digest> DigestHash<D> {
    fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            hasher: D::new(),
            algorithm,
        }
    }
}

impl<D: Digest + Send + 'static> Hash for DigestHash<D> {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.hasher, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.hasher.finalize().to_vec()
    }

    fn output_size(&self) -> usize {
        self.algorithm.output_size()
    }

    fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(algorithm: HashAlgorithm, data: &[u8]) -> Vec<u8> {
        let mut hash = create_hash(algorithm).unwrap();
        hash.update(data);
        hash.finalize()
    }

    #[test]
    fn test_md5_known_vector() {
        let expected = hex::decode("900150983cd24fb0d6963f7d28e17f72").unwrap();
        assert_eq!(digest(HashAlgorithm::Md5, b"abc"), expected);
    }

    #[test]
    fn test_sha1_known_vector() {
        let expected = hex::decode("a9993e364706816aba3e25717850c26c9cd0d89d").unwrap();
        assert_eq!(digest(HashAlgorithm::Sha1, b"abc"), expected);
    }

    #[test]
    fn test_sha256_known_vector() {
        let expected =
            hex::decode("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
                .unwrap();
        assert_eq!(digest(HashAlgorithm::Sha256, b"abc"), expected);
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let mut hash = create_hash(HashAlgorithm::Sha1).unwrap();
        hash.update(b"hello ");
        hash.update(b"world");
        assert_eq!(hash.finalize(), digest(HashAlgorithm::Sha1, b"hello world"));
    }
}
