//! HMAC implementations using the `hmac` crate.

use hmac::{Hmac as HmacImpl, Mac};
use ltls_crypto::{Error, HashAlgorithm, Hmac, Result};
use md5::Md5;
use sha1::Sha1;
use sha2::Sha256;

/// Create an HMAC instance for the specified algorithm and key.
pub fn create_hmac(algorithm: HashAlgorithm, key: &[u8]) -> Result<Box<dyn Hmac>> {
    match algorithm {
        HashAlgorithm::Md5 => Ok(Box::new(MacHmac::<HmacImpl<Md5>>::new(algorithm, key)?)),
        HashAlgorithm::Sha1 => Ok(Box::new(MacHmac::<HmacImpl<Sha1>>::new(algorithm, key)?)),
        HashAlgorithm::Sha256 => Ok(Box::new(MacHmac::<HmacImpl<Sha256>>::new(
            algorithm, key,
        )?)),
    }
}

struct MacHmac<M> {
    mac: M,
    algorithm: HashAlgorithm,
}

impl<M: Mac + hmac::digest::KeyInit> MacHmac<M> {
    fn new(algorithm: HashAlgorithm, key: &[u8]) -> Result<Self> {
        let mac = <M as Mac>::new_from_slice(key)
            .map_err(|_| Error::CryptoError("HMAC key rejected".into()))?;
        Ok(Self { mac, algorithm })
    }
}

impl<M: Mac + Send + 'static> Hmac for MacHmac<M> {
    fn update(&mut self, data: &[u8]) {
        Mac::update(&mut self.mac, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.mac.finalize().into_bytes().to_vec()
    }

    fn output_size(&self) -> usize {
        self.algorithm.output_size()
    }

    fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}
