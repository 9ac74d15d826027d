//! Hash function interface.

/// Hash algorithms used by TLS 1.0-1.2 cipher suites and the PRF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// MD5 (16 bytes output)
    Md5,
    /// SHA-1 (20 bytes output)
    Sha1,
    /// SHA-256 (32 bytes output)
    Sha256,
}

impl HashAlgorithm {
    /// Get the output size in bytes for this hash algorithm.
    pub const fn output_size(self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
        }
    }

    /// Get the internal block size in bytes (used by HMAC).
    pub const fn block_size(self) -> usize {
        64
    }

    /// Get the name of this algorithm.
    pub const fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "MD5",
            HashAlgorithm::Sha1 => "SHA-1",
            HashAlgorithm::Sha256 => "SHA-256",
        }
    }
}

/// Hash function trait.
///
/// # Example
///
/// ```rust,ignore
/// use ltls_crypto::Hash;
///
/// fn hash_example(mut hash: Box<dyn Hash>) -> Vec<u8> {
///     hash.update(b"Hello, ");
///     hash.update(b"world!");
///     hash.finalize()
/// }
/// ```
pub trait Hash: Send {
    /// Update the hash state with more data.
    fn update(&mut self, data: &[u8]);

    /// Finalize the hash and return the digest.
    ///
    /// This consumes the hash state.
    fn finalize(self: Box<Self>) -> Vec<u8>;

    /// Get the output size in bytes for this hash function.
    fn output_size(&self) -> usize;

    /// Get the algorithm identifier.
    fn algorithm(&self) -> HashAlgorithm;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_sizes() {
        assert_eq!(HashAlgorithm::Md5.output_size(), 16);
        assert_eq!(HashAlgorithm::Sha1.output_size(), 20);
        assert_eq!(HashAlgorithm::Sha256.output_size(), 32);
        assert_eq!(HashAlgorithm::Sha1.name(), "SHA-1");
    }
}
