//! Bulk cipher implementations: AES-CBC over the `aes` crate and RC4 over
//! the `rc4` crate.
//!
//! CBC chaining is done here rather than through a mode crate because the
//! record layer needs the chaining block to survive between records
//! (TLS 1.0 implicit IV) and to be replaced per record (TLS 1.1+ explicit
//! IV).

use std::fmt;

use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes256, Block};
use ltls_crypto::{BulkCipher, BulkCipherAlgorithm, Error, Result};
use rc4::consts::U16;
use rc4::{KeyInit as _, Rc4, StreamCipher};
use zeroize::Zeroize;

const AES_BLOCK_SIZE: usize = 16;

/// Create a keyed bulk cipher.
pub fn create_cipher(
    algorithm: BulkCipherAlgorithm,
    key: &[u8],
    iv: &[u8],
) -> Result<Box<dyn BulkCipher>> {
    if key.len() != algorithm.key_size() {
        return Err(Error::InvalidKeySize {
            expected: algorithm.key_size(),
            actual: key.len(),
        });
    }

    match algorithm {
        BulkCipherAlgorithm::Rc4_128 => {
            if !iv.is_empty() {
                return Err(Error::InvalidIvSize {
                    expected: 0,
                    actual: iv.len(),
                });
            }
            Ok(Box::new(Rc4Stream::new(key)?))
        },
        BulkCipherAlgorithm::Aes128Cbc => {
            let cipher = Aes128::new_from_slice(key).map_err(|_| Error::InvalidKeySize {
                expected: 16,
                actual: key.len(),
            })?;
            Ok(Box::new(AesCbc::new(algorithm, AesKey::Aes128(Box::new(cipher)), iv)?))
        },
        BulkCipherAlgorithm::Aes256Cbc => {
            let cipher = Aes256::new_from_slice(key).map_err(|_| Error::InvalidKeySize {
                expected: 32,
                actual: key.len(),
            })?;
            Ok(Box::new(AesCbc::new(algorithm, AesKey::Aes256(Box::new(cipher)), iv)?))
        },
    }
}

enum AesKey {
    Aes128(Box<Aes128>),
    Aes256(Box<Aes256>),
}

impl AesKey {
    fn encrypt_block(&self, block: &mut [u8]) {
        let block = Block::from_mut_slice(block);
        match self {
            AesKey::Aes128(cipher) => cipher.encrypt_block(block),
            AesKey::Aes256(cipher) => cipher.encrypt_block(block),
        }
    }

    fn decrypt_block(&self, block: &mut [u8]) {
        let block = Block::from_mut_slice(block);
        match self {
            AesKey::Aes128(cipher) => cipher.decrypt_block(block),
            AesKey::Aes256(cipher) => cipher.decrypt_block(block),
        }
    }
}

/// AES in CBC mode with a persistent chaining block.
pub struct AesCbc {
    algorithm: BulkCipherAlgorithm,
    key: AesKey,
    chain: [u8; AES_BLOCK_SIZE],
}

impl AesCbc {
    fn new(algorithm: BulkCipherAlgorithm, key: AesKey, iv: &[u8]) -> Result<Self> {
        let mut cbc = Self {
            algorithm,
            key,
            chain: [0u8; AES_BLOCK_SIZE],
        };
        cbc.set_iv(iv)?;
        Ok(cbc)
    }
}

impl fmt::Debug for AesCbc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesCbc")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl Drop for AesCbc {
    fn drop(&mut self) {
        self.chain.zeroize();
    }
}

impl BulkCipher for AesCbc {
    fn algorithm(&self) -> BulkCipherAlgorithm {
        self.algorithm
    }

    fn encrypt(&mut self, data: &mut [u8]) -> Result<()> {
        if data.len() % AES_BLOCK_SIZE != 0 {
            return Err(Error::InvalidLength);
        }
        for block in data.chunks_exact_mut(AES_BLOCK_SIZE) {
            for (b, c) in block.iter_mut().zip(self.chain.iter()) {
                *b ^= c;
            }
            self.key.encrypt_block(block);
            self.chain.copy_from_slice(block);
        }
        Ok(())
    }

    fn decrypt(&mut self, data: &mut [u8]) -> Result<()> {
        if data.len() % AES_BLOCK_SIZE != 0 {
            return Err(Error::InvalidLength);
        }
        let mut saved = [0u8; AES_BLOCK_SIZE];
        for block in data.chunks_exact_mut(AES_BLOCK_SIZE) {
            saved.copy_from_slice(block);
            self.key.decrypt_block(block);
            for (b, c) in block.iter_mut().zip(self.chain.iter()) {
                *b ^= c;
            }
            self.chain = saved;
        }
        Ok(())
    }

    fn set_iv(&mut self, iv: &[u8]) -> Result<()> {
        if iv.len() != AES_BLOCK_SIZE {
            return Err(Error::InvalidIvSize {
                expected: AES_BLOCK_SIZE,
                actual: iv.len(),
            });
        }
        self.chain.copy_from_slice(iv);
        Ok(())
    }
}

/// RC4-128 over the `rc4` crate.
///
/// The keystream position carries over from one record to the next.
pub struct Rc4Stream {
    inner: Rc4<U16>,
}

impl Rc4Stream {
    /// Key the cipher; `key` must be 16 bytes.
    pub fn new(key: &[u8]) -> Result<Self> {
        let inner = Rc4::<U16>::new_from_slice(key).map_err(|_| Error::InvalidKeySize {
            expected: 16,
            actual: key.len(),
        })?;
        Ok(Self { inner })
    }
}

impl fmt::Debug for Rc4Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rc4Stream").finish_non_exhaustive()
    }
}

impl BulkCipher for Rc4Stream {
    fn algorithm(&self) -> BulkCipherAlgorithm {
        BulkCipherAlgorithm::Rc4_128
    }

    fn encrypt(&mut self, data: &mut [u8]) -> Result<()> {
        self.inner.apply_keystream(data);
        Ok(())
    }

    fn decrypt(&mut self, data: &mut [u8]) -> Result<()> {
        self.inner.apply_keystream(data);
        Ok(())
    }

    fn set_iv(&mut self, iv: &[u8]) -> Result<()> {
        if iv.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidIvSize {
                expected: 0,
                actual: iv.len(),
            })
        }
    }
}
