//! Error types for the cryptographic provider.

use std::fmt;

/// Result type for cryptographic operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The requested algorithm is not supported by this provider.
    UnsupportedAlgorithm(String),

    /// Invalid key size for the algorithm.
    InvalidKeySize {
        /// Expected key size in bytes
        expected: usize,
        /// Actual key size in bytes
        actual: usize,
    },

    /// Invalid IV size for the algorithm.
    InvalidIvSize {
        /// Expected IV size in bytes
        expected: usize,
        /// Actual IV size in bytes
        actual: usize,
    },

    /// Input length is not acceptable (e.g. not a multiple of the block size).
    InvalidLength,

    /// Invalid public key (RSA modulus, DH public value).
    InvalidPublicKey,

    /// Invalid private key.
    InvalidPrivateKey,

    /// Domain parameters are unusable (e.g. a DH prime that is too small).
    InvalidParameters(String),

    /// Message too long for the RSA modulus.
    MessageTooLong,

    /// Key exchange failed.
    KeyExchangeFailed,

    /// Random number generation failed.
    RandomGenerationFailed,

    /// General cryptographic error with a message.
    CryptoError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedAlgorithm(s) => write!(f, "Algorithm not supported: {}", s),
            Error::InvalidKeySize { expected, actual } => {
                write!(
                    f,
                    "Invalid key size: expected {} bytes, got {}",
                    expected, actual
                )
            },
            Error::InvalidIvSize { expected, actual } => {
                write!(
                    f,
                    "Invalid IV size: expected {} bytes, got {}",
                    expected, actual
                )
            },
            Error::InvalidLength => write!(f, "Invalid length parameter"),
            Error::InvalidPublicKey => write!(f, "Invalid public key"),
            Error::InvalidPrivateKey => write!(f, "Invalid private key"),
            Error::InvalidParameters(msg) => write!(f, "Invalid parameters: {}", msg),
            Error::MessageTooLong => write!(f, "Message too long for key"),
            Error::KeyExchangeFailed => write!(f, "Key exchange failed"),
            Error::RandomGenerationFailed => write!(f, "Random number generation failed"),
            Error::CryptoError(msg) => write!(f, "Cryptographic error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidKeySize {
            expected: 16,
            actual: 15,
        };
        assert_eq!(err.to_string(), "Invalid key size: expected 16 bytes, got 15");
        assert_eq!(
            Error::UnsupportedAlgorithm("RC2".into()).to_string(),
            "Algorithm not supported: RC2"
        );
    }
}
